pub mod employees;
pub mod principals;
