use std::sync::Arc;
use std::time::Duration;

use cinerama_core::{
    ApiError, CatalogApi, FeedSubscription, PurchaseApi, SeatFeed, SeatInventoryApi,
};
use cinerama_shared::{
    ConfirmRequest, Movie, Product, Receipt, SeatChangeEvent, Showing, TotalBreakdown,
    TotalRequest,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cart::ConcessionCart;
use crate::models::{CheckoutContext, CheckoutDetails, CheckoutStep};
use crate::pricing;
use crate::session::{SeatSelectionSession, SessionError, ToggleOutcome};
use crate::timer::{CheckoutTimer, TimerEvent};

/// Externally visible happenings a UI layer renders from
#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    Tick { remaining_secs: u64 },
    /// The hold window lapsed; the checkout has already been reset back to
    /// seat picking by the time this is observed
    Expired,
    Seat(SeatChangeEvent),
    /// The live feed ended and will not resume
    FeedClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("purchase already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Drives one buyer's checkout end to end: the step wizard, the countdown,
/// the seat selection, the concession cart, and the final confirm. Owns
/// the expiry behavior: when the window lapses everything except typed
/// contact info resets and a fresh window opens on the same showing.
pub struct CheckoutOrchestrator {
    session: SeatSelectionSession,
    cart: ConcessionCart,
    timer: CheckoutTimer,
    timer_events: mpsc::Receiver<TimerEvent>,
    subscription: Option<FeedSubscription>,
    catalog: Arc<dyn CatalogApi>,
    purchase: Arc<dyn PurchaseApi>,
    feed: Arc<dyn SeatFeed>,
    context: CheckoutContext,
    hold_window: Duration,
    step: CheckoutStep,
    details: CheckoutDetails,
    showing: Option<Showing>,
    movie: Option<Movie>,
    products: Vec<Product>,
    server_quote: Option<TotalBreakdown>,
    receipt: Option<Receipt>,
    remaining_secs: u64,
    expired_notice: bool,
}

impl CheckoutOrchestrator {
    pub fn new(
        inventory: Arc<dyn SeatInventoryApi>,
        catalog: Arc<dyn CatalogApi>,
        purchase: Arc<dyn PurchaseApi>,
        feed: Arc<dyn SeatFeed>,
        context: CheckoutContext,
        hold_window: Duration,
    ) -> Self {
        let (timer, timer_events) = CheckoutTimer::new();
        Self {
            session: SeatSelectionSession::new(inventory),
            cart: ConcessionCart::new(),
            timer,
            timer_events,
            subscription: None,
            catalog,
            purchase,
            feed,
            context,
            hold_window,
            step: CheckoutStep::SeatPicking,
            details: CheckoutDetails::default(),
            showing: None,
            movie: None,
            products: Vec::new(),
            server_quote: None,
            receipt: None,
            remaining_secs: 0,
            expired_notice: false,
        }
    }

    /// Open the checkout on a showing: load catalog data and the seat map,
    /// subscribe to the live feed, seed the cart from the caller context
    /// and arm the hold window. The showing and its seat map are required;
    /// everything else degrades with a warning.
    pub async fn begin(&mut self, showing_id: Uuid) -> Result<(), CheckoutError> {
        let showing = self.catalog.get_showing(showing_id).await?;
        self.session.load_showing(showing_id).await?;

        match self.catalog.get_movie(showing.movie_id).await {
            Ok(movie) => self.movie = Some(movie),
            Err(error) => tracing::warn!(%error, "movie lookup failed, continuing without"),
        }
        match self.catalog.list_products().await {
            Ok(products) => self.products = products,
            Err(error) => tracing::warn!(%error, "product list failed, concessions empty"),
        }
        match self.feed.subscribe(showing_id).await {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(error) => {
                tracing::warn!(%error, "live seat feed unavailable, running without");
            }
        }

        if let Some(product_id) = self.context.preselected_product {
            let preselected = self.products.iter().find(|p| p.id == product_id).cloned();
            match preselected {
                Some(product) if self.cart.quantity(product_id) == 0 => {
                    self.cart.add(&product);
                    tracing::info!(product = %product.name, "preselected concession added");
                }
                Some(_) => {}
                None => tracing::warn!(%product_id, "preselected product not active, skipped"),
            }
        }
        self.details.prefill_if_empty(
            &self.context.contact_name,
            &self.context.contact_email,
            &self.context.contact_phone,
        );

        self.showing = Some(showing);
        self.remaining_secs = self.hold_window.as_secs();
        self.timer.start(self.hold_window);
        tracing::info!(%showing_id, "checkout opened");
        Ok(())
    }

    /// Seat toggles are only legal on the seat-picking step
    pub async fn toggle_seat(&mut self, seat_id: Uuid) -> Result<ToggleOutcome, CheckoutError> {
        if self.step != CheckoutStep::SeatPicking {
            return Err(CheckoutError::Validation(
                "seats can only change on the seat-picking step".into(),
            ));
        }
        self.server_quote = None;
        Ok(self.session.toggle(seat_id).await?)
    }

    pub fn add_product(&mut self, product_id: Uuid) -> Result<(), CheckoutError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| CheckoutError::Validation("unknown product".into()))?;
        self.cart.add(&product);
        self.server_quote = None;
        Ok(())
    }

    pub fn remove_product(&mut self, product_id: Uuid) {
        self.cart.remove(product_id);
        self.server_quote = None;
    }

    /// Move forward one step, enforcing that step's gate
    pub async fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::SeatPicking => {
                if self.session.selection_is_empty() {
                    return Err(CheckoutError::Validation("select at least one seat".into()));
                }
                CheckoutStep::Concessions
            }
            CheckoutStep::Concessions => CheckoutStep::Details,
            CheckoutStep::Details => {
                self.details
                    .validate()
                    .map_err(CheckoutError::Validation)?;
                self.refresh_server_quote().await;
                CheckoutStep::Confirm
            }
            CheckoutStep::Confirm => {
                return Err(CheckoutError::Validation(
                    "use confirm to finish the purchase".into(),
                ))
            }
            CheckoutStep::Done => return Err(CheckoutError::AlreadyCompleted),
        };
        Ok(self.step)
    }

    /// Move back one step. Held seats and the cart are kept; going back is
    /// for editing, not abandoning.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::SeatPicking => CheckoutStep::SeatPicking,
            CheckoutStep::Concessions => CheckoutStep::SeatPicking,
            CheckoutStep::Details => CheckoutStep::Concessions,
            CheckoutStep::Confirm => CheckoutStep::Details,
            CheckoutStep::Done => return Err(CheckoutError::AlreadyCompleted),
        };
        Ok(self.step)
    }

    /// Authoritative server total for the review step; display keeps the
    /// local figure when the call fails
    async fn refresh_server_quote(&mut self) {
        let Some(showing) = &self.showing else { return };
        let request = TotalRequest {
            showing_id: showing.id,
            seat_ids: self.session.selected_ids(),
            concession_lines: self.cart.request_lines(),
        };
        match self.purchase.calculate_total(&request).await {
            Ok(breakdown) => self.server_quote = Some(breakdown),
            Err(error) => {
                tracing::warn!(%error, "server total unavailable, showing local figure");
                self.server_quote = None;
            }
        }
    }

    /// The atomic purchase. On success the timer stops, held seats become
    /// the buyer's tickets (no release) and the checkout is terminal. On
    /// failure nothing local changes; the buyer can retry or step back.
    pub async fn confirm(&mut self) -> Result<&Receipt, CheckoutError> {
        if self.step == CheckoutStep::Done {
            return Err(CheckoutError::AlreadyCompleted);
        }
        if self.step != CheckoutStep::Confirm {
            return Err(CheckoutError::Validation(
                "confirm is only available on the review step".into(),
            ));
        }
        let seat_ids = self.session.selected_ids();
        if seat_ids.is_empty() {
            return Err(CheckoutError::Validation("no seats selected".into()));
        }
        self.details
            .validate()
            .map_err(CheckoutError::Validation)?;
        let showing = self
            .showing
            .as_ref()
            .ok_or_else(|| CheckoutError::Validation("checkout was never opened".into()))?;
        let payment_method = self
            .details
            .payment_method
            .ok_or_else(|| CheckoutError::Validation("select a payment method".into()))?;

        let request = ConfirmRequest {
            client_id: self.context.client_id,
            showing_id: showing.id,
            seat_ids,
            concession_lines: self.cart.request_lines(),
            payment_method,
        };
        let receipt = self.purchase.confirm(&request).await?;

        self.timer.stop();
        self.step = CheckoutStep::Done;
        self.expired_notice = false;
        self.session.mark_cleared();
        tracing::info!(code = %receipt.confirmation_code, "purchase confirmed");
        Ok(self.receipt.insert(receipt))
    }

    /// Hold-window lapse: release everything, clear the cart, drop the
    /// payment choice and terms, return to seat picking and open a fresh
    /// window on the same showing. Contact info survives. A no-op after a
    /// completed purchase.
    pub async fn handle_expiry(&mut self) {
        if self.step == CheckoutStep::Done {
            return;
        }
        tracing::info!("hold window expired, resetting checkout");
        self.expired_notice = true;
        self.session.release_all().await;
        self.cart.clear();
        self.server_quote = None;
        self.details.reset_payment();
        self.step = CheckoutStep::SeatPicking;
        if let Err(error) = self.session.reload().await {
            tracing::warn!(%error, "seat map reload after expiry failed");
        }
        self.remaining_secs = self.hold_window.as_secs();
        self.timer.start(self.hold_window);
    }

    fn apply_seat_event(&mut self, event: &SeatChangeEvent) {
        let selected_before = self.session.selected_ids().len();
        self.session.apply_remote_event(event);
        if self.session.selected_ids().len() < selected_before {
            // A pick was taken out from under us; any quoted total is stale
            self.server_quote = None;
        }
    }

    /// Wait for and absorb the next happening (countdown tick, expiry, or
    /// live seat change). Expiry and seat events are already applied when
    /// this returns; the caller only renders. Returns `None` when every
    /// source is exhausted.
    pub async fn next_event(&mut self) -> Option<CheckoutEvent> {
        enum Source {
            Timer(Option<TimerEvent>),
            Feed(Option<SeatChangeEvent>),
        }

        // Pick the winner first, act on it after the select borrows end
        let feed_open = self.subscription.is_some();
        let source = tokio::select! {
            event = self.timer_events.recv() => Source::Timer(event),
            event = next_feed_event(&mut self.subscription), if feed_open => Source::Feed(event),
        };

        match source {
            Source::Timer(Some(TimerEvent::Tick { remaining_secs })) => {
                self.remaining_secs = remaining_secs;
                Some(CheckoutEvent::Tick { remaining_secs })
            }
            Source::Timer(Some(TimerEvent::Expired)) => {
                self.remaining_secs = 0;
                self.handle_expiry().await;
                Some(CheckoutEvent::Expired)
            }
            // The sending half lives on self, so this only happens during
            // teardown
            Source::Timer(None) => None,
            Source::Feed(Some(event)) => {
                self.apply_seat_event(&event);
                Some(CheckoutEvent::Seat(event))
            }
            Source::Feed(None) => {
                self.subscription = None;
                Some(CheckoutEvent::FeedClosed)
            }
        }
    }

    /// Abandon path: release any held seats, stop the countdown and close
    /// the feed. After a completed purchase nothing is released. Safe to
    /// call more than once.
    pub async fn teardown(&mut self) {
        if self.step != CheckoutStep::Done {
            self.session.release_all().await;
        }
        self.timer.stop();
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
        self.session.mark_cleared();
    }

    /// Best current total: the server's figure when one is fresh, the
    /// local mirror otherwise
    pub fn quote(&self) -> Option<TotalBreakdown> {
        if let Some(quote) = &self.server_quote {
            return Some(quote.clone());
        }
        let showing = self.showing.as_ref()?;
        let seats = self.session.selected_seats();
        Some(pricing::local_breakdown(showing, &seats, &self.cart))
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn session(&self) -> &SeatSelectionSession {
        &self.session
    }

    pub fn cart(&self) -> &ConcessionCart {
        &self.cart
    }

    pub fn details(&self) -> &CheckoutDetails {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut CheckoutDetails {
        self.server_quote = None;
        &mut self.details
    }

    pub fn showing(&self) -> Option<&Showing> {
        self.showing.as_ref()
    }

    pub fn movie(&self) -> Option<&Movie> {
        self.movie.as_ref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// True once a hold window has lapsed during this checkout; sticky
    /// until confirmation so the UI can keep the notice visible
    pub fn expired_notice(&self) -> bool {
        self.expired_notice
    }
}

async fn next_feed_event(
    subscription: &mut Option<FeedSubscription>,
) -> Option<SeatChangeEvent> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}
