use std::{sync::Arc, time::Duration};

use claim::{assert_ok, assert_some_eq};
use portfolio_contact::{
    contact_form::{ContactForm, ContactSender, Notification},
    domain::{ContactField, ContactFormData, SubmissionStatus},
};

use crate::helper::{assert_delivered_to, spawn_app, spawn_app_with, FakeRelay};

const RESET_DELAY: Duration = Duration::from_millis(200);

fn fill<S: ContactSender>(form: &ContactForm<S>, name: &str, email: &str, message: &str) {
    form.update_field(ContactField::Name, name);
    form.update_field(ContactField::Email, email);
    form.update_field(ContactField::Message, message);
}

async fn assert_returns_to_idle<S: ContactSender>(form: &ContactForm<S>) {
    let mut status = form.subscribe();
    let idle = tokio::time::timeout(
        RESET_DELAY * 10,
        status.wait_for(|s| *s == SubmissionStatus::Idle),
    )
    .await;
    assert_ok!(assert_ok!(idle));
}

#[actix_web::test]
async fn successful_submission_clears_the_form() {
    let app = spawn_app().await;
    let form = ContactForm::with_reset_delay(app.contact_client(), RESET_DELAY);
    fill(&form, "Jane", "jane@x.com", "Hi");

    assert_some_eq!(form.submit().await, Notification::success());
    assert_eq!(form.status(), SubmissionStatus::Success);
    assert!(form.fields().is_empty());

    let delivered = app.relay.delivered();
    assert_eq!(delivered.len(), 1);
    assert_delivered_to(&delivered[0], &app.recipients());

    assert_returns_to_idle(&form).await;
}

#[actix_web::test]
async fn empty_name_never_reaches_the_relay() {
    let app = spawn_app().await;
    let form = ContactForm::with_reset_delay(app.contact_client(), RESET_DELAY);
    fill(&form, "", "jane@x.com", "Hi");

    assert_some_eq!(form.submit().await, Notification::failure());
    assert_eq!(form.status(), SubmissionStatus::Error);
    assert_eq!(form.fields(), ContactFormData::new("", "jane@x.com", "Hi"));
    assert!(app.relay.delivered().is_empty());

    assert_returns_to_idle(&form).await;
    assert_eq!(form.fields(), ContactFormData::new("", "jane@x.com", "Hi"));
}

#[actix_web::test]
async fn rejected_relay_authentication_fails_the_submission() {
    let app = spawn_app_with(
        FakeRelay::rejecting("535 5.7.8 Username and Password not accepted"),
        |_| {},
    )
    .await;
    let form = ContactForm::with_reset_delay(app.contact_client(), RESET_DELAY);
    fill(&form, "Jane", "jane@x.com", "Hi");

    assert_some_eq!(form.submit().await, Notification::failure());
    assert_eq!(form.status(), SubmissionStatus::Error);
    assert_eq!(form.fields(), ContactFormData::new("Jane", "jane@x.com", "Hi"));

    assert_returns_to_idle(&form).await;
}

#[actix_web::test]
async fn form_can_be_resubmitted_after_a_failure() {
    let app = spawn_app().await;
    let form = ContactForm::with_reset_delay(app.contact_client(), RESET_DELAY);
    fill(&form, "Jane", "", "Hi");

    assert_some_eq!(form.submit().await, Notification::failure());
    assert_returns_to_idle(&form).await;

    form.update_field(ContactField::Email, "jane@x.com");
    assert_some_eq!(form.submit().await, Notification::success());
    assert_eq!(app.relay.delivered().len(), 1);
}

#[actix_web::test]
async fn in_process_dispatcher_submission() {
    let app = spawn_app().await;
    let relay = Arc::new(FakeRelay::accepting());
    let form = ContactForm::with_reset_delay(app.dispatcher(relay.clone()), RESET_DELAY);
    fill(&form, "Jane", "jane@x.com", "Hi");

    assert_some_eq!(form.submit().await, Notification::success());
    assert!(form.fields().is_empty());
    assert_eq!(relay.delivered().len(), 1);
    assert!(app.relay.delivered().is_empty());

    assert_returns_to_idle(&form).await;
}
