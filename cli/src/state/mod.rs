pub mod reducers;
pub mod store;
