use std::error::Error;

use tracing::{error, info, warn, Instrument};

use ledgerly::app_system::{setup_tracing, LedgerSystem};
use ledgerly::auth::{AuthSession, SignupForm};
use ledgerly::config::PlatformConfig;
use ledgerly::dashboard::{audit_payment_fields, format_currency, Dashboard, OrderForm};
use ledgerly::domain::{OrderEdit, OrderStatus};
use ledgerly::routing::{self, Route};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config =
        PlatformConfig::from_env().inspect_err(|e| error!(error = %e, "Configuration invalid"))?;
    info!("Starting Ledgerly");

    let system = LedgerSystem::new(&config);
    let session = AuthSession::start(&system.auth).await?;
    let initial = session.ready().await?;
    info!(route = routing::settle(Route::Landing, &initial).path(), "Session ready");

    let mut signup = SignupForm::new("owner@example.com", "ledgerly-demo");
    let Some(route) = signup.submit(&system.auth).await else {
        warn!(reason = signup.error().unwrap_or_default(), "Sign-up failed");
        session.shutdown().await;
        system.shutdown().await?;
        return Ok(());
    };
    let user = session.signed_in_user().await?;
    info!(uid = %user.uid, route = route.path(), "Signed up");

    let dashboard = Dashboard::open(system.store.clone(), &session.current()).await?;

    let span = tracing::info_span!("order_walkthrough");
    async {
        let mut form = OrderForm::new("Team dinner");
        let Some(order) = form.submit(&dashboard).await else {
            warn!(reason = form.error().unwrap_or_default(), "Order creation failed");
            return Ok::<_, Box<dyn Error>>(());
        };

        let mut people = Vec::new();
        for name in ["Ana", "Ben", "Cy"] {
            people.push(dashboard.add_person(&order.id, name).await?.id);
        }
        if let [first, .., last] = people.as_slice() {
            dashboard.toggle_payment(&order.id, first).await?;
            dashboard.delete_person(&order.id, last).await?;
        }

        let edit = OrderEdit::from_inputs("Team dinner", "180.50", "95", OrderStatus::AwaitingFulfillment);
        dashboard.edit_order(&order.id, edit).await?;

        let lunch = dashboard.add_order("Lunch").await?;
        dashboard.delete_order(&lunch.id).await?;
        dashboard.add_order("Supplies").await?;
        Ok(())
    }
    .instrument(span)
    .await?;

    let state = dashboard.state();
    let metrics = state.metrics();
    info!(
        total_orders = metrics.total_orders,
        total_profit = %format_currency(metrics.total_profit),
        pending_orders = metrics.pending_orders,
        "Dashboard metrics"
    );

    for issue in audit_payment_fields(&state.orders) {
        warn!(
            order_id = %issue.order_id,
            issue = %serde_json::to_string(&issue)?,
            "Order carries misspelled paymentsRecieved field"
        );
    }
    info!(state = %serde_json::to_string(&state)?, "Final dashboard state");

    dashboard.close().await;
    system.auth.sign_out().await?;
    let signed_out = session.signed_out().await?;
    info!(
        route = routing::after_sign_out().path(),
        dashboard_redirect = routing::settle(Route::Dashboard, &signed_out).path(),
        "Signed out"
    );

    let returning = system.auth.sign_in("owner@example.com", "ledgerly-demo").await?;
    let signed_in = session.signed_in_user().await?;
    info!(
        uid = %returning.uid,
        same_account = signed_in == user,
        route = routing::settle(Route::Login, &session.current()).path(),
        "Signed back in"
    );
    system.auth.sign_out().await?;

    session.shutdown().await;
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
