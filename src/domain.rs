mod contact_field;
mod contact_form_data;
mod contact_payload;
mod required_text;
mod submission_status;

pub use contact_field::ContactField;
pub use contact_form_data::ContactFormData;
pub use contact_payload::ContactPayload;
pub use required_text::RequiredText;
pub use submission_status::SubmissionStatus;
