pub mod p10_filter_transform;
pub mod p10_insert_transform;
