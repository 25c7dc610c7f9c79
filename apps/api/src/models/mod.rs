pub mod application;
pub mod assessment;
pub mod candidate;
pub mod job;

pub use application::{
    Application, ApplicationPatch, ApplicationStatus, NewApplication, PipelineStage, StageChange,
    StatusUpdate,
};
pub use assessment::{
    Assessment, AssessmentDraft, Question, QuestionKind, Section, ShowWhen, Submission,
    SubmissionRequest, ValidationRules,
};
pub use candidate::{Candidate, CandidatePatch, NewCandidate, TimelineEntry};
pub use job::{Job, JobPatch, JobStatus, JobType, NewJob, ReorderRequest};
