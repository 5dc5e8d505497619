pub mod scoped_store;
pub mod validator;
