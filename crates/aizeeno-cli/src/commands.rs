//! Command Handlers

use std::sync::Arc;

use aizeeno_payments::{
    CheckoutSurface, PaymentConfig, PaymentError, PaymentRedirect, ReturnVerifier,
    VerificationOutcome, checkout_message, record_login,
};
use anyhow::bail;
use async_trait::async_trait;

use crate::state::AppState;

/// Hands the session to the user's browser by printing it
pub struct TerminalRedirect;

#[async_trait]
impl PaymentRedirect for TerminalRedirect {
    async fn redirect_to_checkout(
        &self,
        publishable_key: &str,
        session_id: &str,
    ) -> aizeeno_payments::Result<()> {
        if publishable_key.is_empty() {
            return Err(PaymentError::Redirect("no publishable key".into()));
        }
        println!("Checkout session created: {session_id}");
        println!("Complete payment in your browser, then run:");
        println!("  aizeeno verify '<return-url>'");
        Ok(())
    }
}

/// Record the signed-in user locally
pub fn login(state: &AppState, username: &str, name: &str, email: Option<&str>) {
    let session = record_login(state.store.as_ref(), username, name, email);
    println!("Signed in as {} ({})", session.display_name, session.username_id);
}

/// Show the stored user record
pub fn status(state: &AppState) -> anyhow::Result<()> {
    match state.store.get() {
        Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Fetch and show the payment config
pub async fn config(state: &AppState) -> anyhow::Result<()> {
    let config = match PaymentConfig::fetch(&state.requester).await {
        Ok(config) => config,
        Err(err) => bail!("Failed to load payment configuration: {err}"),
    };

    println!("Backend:  {}", state.context.backend_base_url);
    println!("Key mode: {}", config.key_mode().as_str());
    if config.price_table.is_empty() {
        println!("No plans listed.");
    }
    for (plan, price) in &config.price_table {
        println!("  {plan:<12} {price}");
    }
    Ok(())
}

/// Start a checkout for `plan`
pub async fn checkout(state: &AppState, plan: &str) -> anyhow::Result<()> {
    let surface = CheckoutSurface::initialize(
        state.requester.clone(),
        state.store.clone(),
        Arc::new(TerminalRedirect),
    )
    .await;

    let initiator = match surface {
        CheckoutSurface::Ready(initiator) => initiator,
        CheckoutSurface::Disabled(err) => bail!(err.user_message()),
    };

    if let Err(err) = initiator.start_checkout(plan).await {
        if matches!(err, PaymentError::Unauthenticated) {
            bail!("Please log in or sign up before subscribing: aizeeno login --username <name>");
        }
        bail!(checkout_message(&err));
    }
    Ok(())
}

/// Verify a return from the payment page
pub async fn verify(state: &AppState, location: &str) -> anyhow::Result<()> {
    let verifier = ReturnVerifier::new(state.requester.clone(), state.store.clone());
    let outcome = verifier.verify(location).await;
    let message = outcome.message();

    match outcome {
        VerificationOutcome::NotReturning => {
            println!("No session_id in the URL; nothing to verify.");
        }
        VerificationOutcome::Confirmed { session, .. } => {
            println!("{}", message.unwrap_or_default());
            if let Some(tier) = session.subscription_tier {
                println!("Subscription: {tier}");
            }
        }
        VerificationOutcome::Pending { .. } => {
            println!("{}", message.unwrap_or_default());
        }
        VerificationOutcome::Failed(_) => {
            bail!(message.unwrap_or_else(|| "Unable to verify payment.".into()));
        }
    }
    Ok(())
}
