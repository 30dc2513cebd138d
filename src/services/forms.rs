//! Public form submissions
//!
//! Every form validates before anything is written. Inquiries are numbered
//! by the database before insert. Responses carry WhatsApp and email links
//! pre-filled with what the visitor submitted.

use super::content::{ContentError, ContentService};
use super::deeplink::{product_inquiry_message, ContactLinks};
use crate::config::ContactConfig;
use crate::db::repositories::RpcRepository;
use crate::models::community::{JoinNetworkInput, SubmitStoryInput};
use crate::models::email::{SubscribeForm, UpdateSubscriptionInput};
use crate::models::{
    FarmerNetworkMember, FieldErrors, Inquiry, InquiryForm, NewsletterSubscription,
    QuickInquiryForm, StorySubmission, Validate,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("No subscription found for {0}")]
    NotSubscribed(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<FieldErrors> for FormError {
    fn from(errors: FieldErrors) -> Self {
        FormError::Validation(errors)
    }
}

/// A stored submission plus follow-up links
#[derive(Debug, Clone, Serialize)]
pub struct Submitted<T> {
    pub record: T,
    pub links: ContactLinks,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscribed {
    pub subscription: NewsletterSubscription,
    pub already_subscribed: bool,
}

#[derive(Clone)]
pub struct FormService {
    inquiries: ContentService<Inquiry>,
    network: ContentService<FarmerNetworkMember>,
    submissions: ContentService<StorySubmission>,
    subscriptions: ContentService<NewsletterSubscription>,
    rpc: Arc<dyn RpcRepository>,
    contact: ContactConfig,
}

impl FormService {
    pub fn new(
        inquiries: ContentService<Inquiry>,
        network: ContentService<FarmerNetworkMember>,
        submissions: ContentService<StorySubmission>,
        subscriptions: ContentService<NewsletterSubscription>,
        rpc: Arc<dyn RpcRepository>,
        contact: ContactConfig,
    ) -> Self {
        Self {
            inquiries,
            network,
            submissions,
            subscriptions,
            rpc,
            contact,
        }
    }

    pub async fn submit_inquiry(&self, form: InquiryForm) -> Result<Submitted<Inquiry>, FormError> {
        form.validate()?;
        let number = self.rpc.generate_inquiry_number().await?;
        let inquiry = self.inquiries.create(form.into_create(number)).await?;

        tracing::info!(
            "Inquiry {} received from {}",
            inquiry.inquiry_number.as_deref().unwrap_or("-"),
            inquiry.email
        );
        let message = match inquiry.message.as_deref() {
            Some(text) => format!("Hello, I am {}. {}", inquiry.name, text),
            None => format!("Hello, I am {}.", inquiry.name),
        };
        let links = ContactLinks::build(&self.contact, &inquiry_subject(&inquiry), &message);
        Ok(Submitted {
            record: inquiry,
            links,
        })
    }

    pub async fn submit_quick_inquiry(
        &self,
        form: QuickInquiryForm,
    ) -> Result<Submitted<Inquiry>, FormError> {
        form.validate()?;
        let number = self.rpc.generate_inquiry_number().await?;
        let inquiry = self.inquiries.create(form.into_create(number)).await?;

        tracing::info!(
            "Quick inquiry {} for {}",
            inquiry.inquiry_number.as_deref().unwrap_or("-"),
            inquiry.product_name.as_deref().unwrap_or("unspecified product")
        );
        let message = product_inquiry_message(
            &inquiry.name,
            inquiry.product_name.as_deref(),
            inquiry.quantity.as_deref(),
            inquiry.quantity_unit.as_deref(),
        );
        let links = ContactLinks::build(&self.contact, &inquiry_subject(&inquiry), &message);
        Ok(Submitted {
            record: inquiry,
            links,
        })
    }

    pub async fn join_network(
        &self,
        input: JoinNetworkInput,
    ) -> Result<Submitted<FarmerNetworkMember>, FormError> {
        input.validate()?;
        let member = self.network.create(input.into_submission()).await?;

        let mut message = format!("Hello, I am {}. I would like to join the farmer network.", member.full_name);
        if let Some(village) = member.village.as_deref() {
            message.push_str(&format!(" Village: {village}."));
        }
        if !member.crops.is_empty() {
            message.push_str(&format!(" Crops: {}.", member.crops.join(", ")));
        }
        let links = ContactLinks::build(&self.contact, "Farmer network registration", &message);
        Ok(Submitted {
            record: member,
            links,
        })
    }

    pub async fn submit_story(
        &self,
        input: SubmitStoryInput,
    ) -> Result<Submitted<StorySubmission>, FormError> {
        input.validate()?;
        let submission = self.submissions.create(input.into_submission()).await?;

        let message = format!(
            "Hello, I am {}. I have shared my story \"{}\".",
            submission.name, submission.story_title
        );
        let links = ContactLinks::build(
            &self.contact,
            &format!("Story submission: {}", submission.story_title),
            &message,
        );
        Ok(Submitted {
            record: submission,
            links,
        })
    }

    /// Subscribe an address; an inactive subscription is reactivated
    pub async fn subscribe(&self, form: SubscribeForm) -> Result<Subscribed, FormError> {
        form.validate()?;
        let email = form.email.trim().to_string();

        if let Some(existing) = self.subscriptions.find_by("email", email.as_str()).await? {
            if existing.is_active {
                return Ok(Subscribed {
                    subscription: existing,
                    already_subscribed: true,
                });
            }
            let patch = UpdateSubscriptionInput {
                is_active: Some(true),
                ..Default::default()
            };
            let subscription = self.subscriptions.update(&existing.id, patch).await?;
            tracing::info!("Newsletter subscription reactivated for {}", email);
            return Ok(Subscribed {
                subscription,
                already_subscribed: false,
            });
        }

        let subscription = self.subscriptions.create(form.into_create()).await?;
        tracing::info!("New newsletter subscription for {}", email);
        Ok(Subscribed {
            subscription,
            already_subscribed: false,
        })
    }

    pub async fn unsubscribe(&self, email: &str) -> Result<NewsletterSubscription, FormError> {
        let email = email.trim();
        let existing = self
            .subscriptions
            .find_by("email", email)
            .await?
            .ok_or_else(|| FormError::NotSubscribed(email.to_string()))?;

        let patch = UpdateSubscriptionInput {
            is_active: Some(false),
            ..Default::default()
        };
        let subscription = self.subscriptions.update(&existing.id, patch).await?;
        tracing::info!("Newsletter subscription cancelled for {}", email);
        Ok(subscription)
    }
}

fn inquiry_subject(inquiry: &Inquiry) -> String {
    match inquiry.inquiry_number.as_deref() {
        Some(number) => format!("Inquiry {number}"),
        None => "Inquiry".to_string(),
    }
}
