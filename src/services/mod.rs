pub mod history;
pub mod session_manager;
pub mod transport;
pub mod upstream;
pub mod view;
