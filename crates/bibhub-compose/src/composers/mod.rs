pub mod attachments;
pub mod changelog;
pub mod citation;

pub use attachments::AttachmentListComposer;
pub use changelog::ChangeLogComposer;
pub use citation::CitationComposer;
