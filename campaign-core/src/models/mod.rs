pub mod brand;
pub mod brief;
pub mod output;
pub mod safety;
pub mod thread;

pub use brand::BrandKit;
pub use brief::{BriefField, CampaignBriefData, Language, SelectedBrief};
pub use output::{CampaignOutput, CampaignVersion, Structured};
pub use safety::{IssueType, SafetyIssue, SafetyReport, Severity};
pub use thread::{
    Agent, AgentThread, MessageRole, RunError, RunStatus, SortOrder, ThreadMessage, ThreadRun,
};
