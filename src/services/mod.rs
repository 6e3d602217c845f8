pub mod answer_key_resolver;
pub mod deduplicator;
pub mod layout_classifier;
pub mod option_extractor;
pub mod question_segmenter;
pub mod reject_writer;
pub mod text_cleaner;
pub mod token_reconstructor;

pub use answer_key_resolver::AnswerKeyResolver;
pub use deduplicator::Deduplicator;
pub use layout_classifier::{LayoutClassifier, LayoutDecision, OptionStyle, StyleRule};
pub use option_extractor::{DropReason, OptionExtractor, OptionLayout};
pub use question_segmenter::{QuestionSegmenter, SegmentOutcome, SegmentStats};
pub use reject_writer::RejectWriter;
pub use text_cleaner::TextCleaner;
pub use token_reconstructor::{ColumnLayout, LogicalLine, TokenReconstructor};
