pub mod metric_publisher;
pub mod object_lister;
pub mod window_counter;
