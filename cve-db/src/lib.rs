pub mod db;
pub mod feed;
pub mod pipeline;
