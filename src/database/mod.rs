pub mod books;
pub mod manager;
pub mod models;
pub mod users;

pub use books::BookRepository;
pub use users::UserRepository;
