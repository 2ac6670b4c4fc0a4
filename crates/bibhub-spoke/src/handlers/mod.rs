//! Concrete spoke handlers, one per primary hook kind.

mod article;
mod document;
mod litsearch;

pub use article::ArticleHandler;
pub use document::DocumentHandler;
pub use litsearch::LitSearchHandler;
