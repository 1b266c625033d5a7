pub mod domain;
pub mod ports;
pub mod prompt;

pub use domain::{
    AnalysisRequest, AnalysisResult, Flashcard, NewStudySession, QuizQuestion, StudySession,
    SubjectProgress, User,
};
pub use ports::{DatabaseService, MaterialStore, PortError, PortResult, TextAnalysisService};
