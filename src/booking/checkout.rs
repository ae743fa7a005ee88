use std::time::Duration;

use anyhow::{Context, Result};

use crate::{
    automation::AutomationClient,
    error::EngineError,
    models::{EffectiveSearch, PaymentDetails, Train},
    notify::{messages, Notifier},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Pays for a seat that was just claimed.
///
/// Runs at most once per claim. Any failure is escalated as
/// [`EngineError::Payment`] after the operator has been told to take over.
pub struct CheckoutOrchestrator<'a> {
    search: &'a EffectiveSearch,
    notifier: &'a dyn Notifier,
    dialog_timeout: Duration,
}

impl<'a> CheckoutOrchestrator<'a> {
    pub fn new(
        search: &'a EffectiveSearch,
        notifier: &'a dyn Notifier,
        dialog_timeout: Duration,
    ) -> Self {
        Self {
            search,
            notifier,
            dialog_timeout,
        }
    }

    pub async fn checkout(
        &self,
        client: &mut dyn AutomationClient,
        train: &Train,
        payment: &PaymentDetails,
    ) -> Result<(), EngineError> {
        log_info!("checking out {} {}", train.category, train.number);

        match self.run_steps(client, payment).await {
            Ok(()) => {
                log_info!("payment completed for {} {}", train.category, train.number);
                self.notifier
                    .notify(&messages::payment_succeeded(train, self.search))
                    .await;
                Ok(())
            }
            Err(source) => {
                log::error!(
                    "payment failed for {} {}: {source:#}",
                    train.category,
                    train.number
                );
                self.notifier
                    .notify(&messages::payment_failed(train, self.search))
                    .await;
                Err(EngineError::Payment {
                    train: format!("{}({})", train.category, train.number),
                    source,
                })
            }
        }
    }

    async fn run_steps(
        &self,
        client: &mut dyn AutomationClient,
        payment: &PaymentDetails,
    ) -> Result<()> {
        client
            .fill_checkout_form(payment)
            .await
            .context("failed to fill checkout form")?;
        self.accept_dialog(client, "ticket delivery").await?;

        client
            .confirm_payment()
            .await
            .context("failed to confirm payment")?;
        self.accept_dialog(client, "payment confirmation").await?;
        Ok(())
    }

    /// A dialog that never shows up is fine; a broken client is not.
    async fn accept_dialog(&self, client: &mut dyn AutomationClient, step: &str) -> Result<()> {
        let accepted = client
            .dismiss_pending_dialog(self.dialog_timeout)
            .await
            .with_context(|| format!("failed to handle {step} dialog"))?;
        if !accepted {
            log_debug!("no {step} dialog within {:?}", self.dialog_timeout);
        }
        Ok(())
    }
}
