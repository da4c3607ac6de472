use super::{ContactField, ContactFormData, RequiredText};

#[derive(Debug)]
pub struct ContactPayload {
    pub name: RequiredText,
    pub email: RequiredText,
    pub message: RequiredText,
}

impl TryFrom<ContactFormData> for ContactPayload {
    type Error = String;

    fn try_from(form: ContactFormData) -> Result<Self, Self::Error> {
        let name = RequiredText::parse(ContactField::Name, form.name)?;
        let email = RequiredText::parse(ContactField::Email, form.email)?;
        let message = RequiredText::parse(ContactField::Message, form.message)?;

        Ok(Self {
            name,
            email,
            message,
        })
    }
}
