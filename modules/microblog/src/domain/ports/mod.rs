pub mod clock;
pub mod language;
pub mod mailer;
pub mod search_index;

pub use clock::{Clock, ManualClock, SystemClock};
pub use language::{LanguageDetector, UndetectedLanguage};
pub use mailer::Mailer;
pub use search_index::{Document, IndexError, IndexHits, SearchIndex};
