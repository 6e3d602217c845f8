pub mod loaders;
pub mod page;
pub mod question;

pub use loaders::{load_all_documents, load_document};
pub use page::{DocumentInput, PageInput, PositionedToken};
pub use question::{
    AnswerKeyMap, AnswerMark, ColumnStream, MarkerForm, McqRecord, OptionKey, QuestionSpan,
};
