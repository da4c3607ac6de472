use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};

use crate::{
    contact_client::ErrorBody,
    domain::ContactFormData,
    mail_dispatcher::{MailDispatcher, SendError},
};

#[tracing::instrument(
    name = "Relaying contact form",
    skip(form, dispatcher),
    fields(
        %form.name,
        %form.email
    )
)]
pub async fn contact(
    form: web::Form<ContactFormData>,
    dispatcher: web::Data<MailDispatcher>,
) -> Result<HttpResponse, SendError> {
    let receipt = dispatcher.send(form.0).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

impl ResponseError for SendError {
    fn status_code(&self) -> StatusCode {
        match self {
            SendError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SendError::DispatchError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.to_string(),
        })
    }
}
