mod authorized_instance;

pub use authorized_instance::AuthorizedInstance;
