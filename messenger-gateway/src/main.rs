//! Messenger Gateway - webhook receiver.
//!
//! This binary:
//! - Answers the platform's subscription handshake
//! - Verifies and decodes event deliveries
//! - Logs every event through the registered handlers
//! - Replies to text messages with an echo when an access token is configured

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use messenger::{Config, GraphClient, HandlerRegistry, Messenger};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        verify_token_configured = !config.verify_token.is_empty(),
        signature_verification = config.verifies_signatures(),
        access_token_configured = !config.access_token.is_empty(),
        graph_api_url = %config.graph_api_url,
        graph_api_debug = ?config.graph_api_debug,
        "config_loaded"
    );

    if !config.verifies_signatures() {
        warn!("webhook_signature_verification_disabled");
    }

    let messenger = Messenger::new(config).context("Failed to create Graph API client")?;
    let reply = !messenger.config().access_token.is_empty();
    let handlers = build_handlers(messenger.graph().clone(), reply);
    let messenger = messenger.with_handlers(handlers);

    info!(handlers = ?messenger.handlers(), "handlers_registered");

    let app = messenger.router();

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], messenger.config().port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Handlers that log every event kind, echoing text messages back when
/// `reply` is set.
fn build_handlers(graph: GraphClient, reply: bool) -> HandlerRegistry {
    HandlerRegistry::new()
        .on_message_received(move |ctx, opts, message| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                mid = %message.mid,
                text_length = message.text.len(),
                attachments = message.attachments.len(),
                "message_received"
            );

            if !reply || message.text.is_empty() {
                return;
            }

            let graph = graph.clone();
            let recipient = opts.sender.id.clone();
            let text = message.text.clone();
            tokio::spawn(async move {
                if let Err(e) = graph.send_text(&recipient, &text).await {
                    error!(recipient_id = %recipient, error = %e, "echo_reply_failed");
                }
            });
        })
        .on_message_echo(|ctx, opts, echo| {
            info!(
                page_id = %ctx.id,
                recipient_id = %opts.recipient.id,
                mid = %echo.message.mid,
                app_id = ?echo.app_id,
                "message_echo"
            );
        })
        .on_message_delivered(|ctx, opts, delivery| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                mids = delivery.mids.len(),
                watermark = delivery.watermark,
                "message_delivered"
            );
        })
        .on_message_read(|ctx, opts, read| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                watermark = read.watermark,
                "message_read"
            );
        })
        .on_postback(|ctx, opts, postback| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                payload = %postback.payload,
                "postback"
            );
        })
        .on_authentication(|ctx, opts, optin| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                has_optin = optin.is_some(),
                reference = optin.map(|o| o.reference.as_str()).unwrap_or(""),
                "authentication"
            );
        })
        .on_take_thread(|ctx, opts, take| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                previous_owner_app_id = take.previous_owner_app_id,
                "thread_taken"
            );
        })
        .on_pass_thread(|ctx, opts, pass| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                new_owner_app_id = pass.new_owner_app_id,
                "thread_passed"
            );
        })
        .on_request_thread(|ctx, opts, request| {
            info!(
                page_id = %ctx.id,
                sender_id = %opts.sender.id,
                requested_owner_app_id = request.requested_owner_app_id,
                "thread_requested"
            );
        })
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("gateway_shutting_down");
}
