pub mod string;

pub use string::{is_valid_attr_name, is_valid_node_name, mask_value, mask_value_into};
