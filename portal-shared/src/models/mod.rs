//! Request and response payloads grouped by API area.

pub mod commission;
pub mod envelope;
pub mod invitation;
pub mod job;
pub mod user;

pub use commission::{Commission, EarningsSummary};
pub use envelope::ApiEnvelope;
pub use invitation::{
    Invitation, InvitationStats, PendingInvitations, SendInvitationRequest,
    SendInvitationResponse,
};
pub use job::{
    Application, ApplicationListResponse, EnquiryRequest, EnquiryResponse, Job, JobDetailResponse,
    JobFilter, JobListResponse, JobType, JobTypesResponse, MyRequestsResponse,
};
pub use user::{
    AgentUser, LoginRequest, LoginResponse, ProfileUpdate, ProfileUpdateResponse, UserRole,
    VerifyResponse,
};
