pub mod approval;
pub mod employee;
pub mod event;
pub mod order;
pub mod product;
