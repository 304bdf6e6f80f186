pub mod category;
pub mod currency;
pub mod error;
pub mod listing;
pub mod phone;
pub mod producer;
pub mod product;
pub mod subscription;
