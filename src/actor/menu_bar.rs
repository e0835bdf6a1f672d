use tracing::{debug, instrument, trace};

use crate::actor;
use crate::common::config::Config;
use crate::layout_engine::SlotTarget;
use crate::model::occupancy::RefreshOutcome;
use crate::model::preferences::SharedPreferences;
use crate::model::style::PreviewState;
use crate::sys::render::Bitmap;
use crate::sys::screen::SpaceId;
use crate::sys::timer::Timer;
use crate::ui::menu_bar::MenuIcon;

#[derive(Debug)]
pub enum Event {
    /// The active space or the space list changed.
    SpaceChanged,
    PreferencesChanged,
    ConfigUpdated(Config),
    /// Periodic or menu-open opportunity to pick up background results.
    Tick,
    BeginPreview(PreviewState),
    EndPreview,
    MenuClosed,
    /// A click at this x offset within the icon.
    Click(f64),
    OccupancyRefreshed(RefreshOutcome),
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Icon(Bitmap),
    /// Background data changed; re-render at the next natural opportunity.
    IconNeedsRefresh,
    SwitchToSpace(usize),
    ActivateAppOnSpace(SpaceId),
    /// The menu bar was disabled; remove the status item.
    Hidden,
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

pub struct Menu {
    config: Config,
    rx: Receiver,
    completed_rx: actor::Receiver<RefreshOutcome>,
    icon: MenuIcon,
    preferences: SharedPreferences,
    notices: actor::Sender<Notice>,
    last_icon: Option<Bitmap>,
}

impl Menu {
    /// `completed_rx` must be the receiving end of the channel handed to the
    /// icon's occupancy cache, and `preferences` the store its snapshotter
    /// reads. Config reloads replace the preferences held there.
    pub fn new(
        config: Config,
        rx: Receiver,
        completed_rx: actor::Receiver<RefreshOutcome>,
        mut icon: MenuIcon,
        preferences: SharedPreferences,
        notices: actor::Sender<Notice>,
    ) -> Self {
        icon.set_metrics(config.settings.menu_bar.metrics);
        icon.set_occupancy_ttl(config.settings.menu_bar.occupancy_ttl());
        Self {
            config,
            rx,
            completed_rx,
            icon,
            preferences,
            notices,
            last_icon: None,
        }
    }

    pub async fn run(mut self) {
        let mut pending = false;
        let mut timer = Timer::manual();

        self.refresh();

        loop {
            tokio::select! {
                _ = &mut timer, if pending => {
                    pending = false;
                    self.refresh();
                }

                Some((span, outcome)) = self.completed_rx.recv() => {
                    let _enter = span.enter();
                    self.handle_event(Event::OccupancyRefreshed(outcome));
                }

                maybe = self.rx.recv() => {
                    match maybe {
                        Some((span, event)) => {
                            let _enter = span.enter();
                            match event {
                                Event::SpaceChanged => {
                                    self.icon.space_changed();
                                    pending = true;
                                    timer.set_next_fire(self.config.settings.menu_bar.debounce());
                                }
                                Event::PreferencesChanged => {
                                    pending = true;
                                    timer.set_next_fire(self.config.settings.menu_bar.debounce());
                                }
                                event => self.handle_event(event),
                            }
                        }
                        None => {
                            if pending {
                                self.refresh();
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    #[instrument(name = "menu_bar::handle_event", skip(self))]
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::SpaceChanged => {
                self.icon.space_changed();
                self.refresh();
            }
            Event::PreferencesChanged | Event::Tick => self.refresh(),
            Event::ConfigUpdated(config) => self.handle_config_updated(config),
            Event::BeginPreview(state) => {
                if !self.enabled() {
                    return;
                }
                let bitmap = self.icon.begin_preview(state);
                self.publish(bitmap);
            }
            Event::EndPreview | Event::MenuClosed => {
                if self.icon.end_preview() {
                    self.refresh();
                }
            }
            Event::Click(x) => self.handle_click(x),
            Event::OccupancyRefreshed(outcome) => {
                let applied = self.icon.apply_refresh(outcome);
                if self.enabled() && applied.needs_icon_refresh() {
                    self.notify(Notice::IconNeedsRefresh);
                }
            }
        }
    }

    fn handle_click(&mut self, x: f64) {
        let target = self.icon.slot_at(x).map(|slot| slot.target);
        debug!(x, ?target, "click");
        match target {
            Some(SlotTarget::SwitchTo { index }) => self.notify(Notice::SwitchToSpace(index)),
            Some(SlotTarget::ActivateApp { space_id }) => {
                self.notify(Notice::ActivateAppOnSpace(space_id))
            }
            Some(SlotTarget::Separator | SlotTarget::None) | None => {}
        }
        if self.icon.end_preview() {
            self.refresh();
        }
    }

    fn handle_config_updated(&mut self, new_config: Config) {
        let was_enabled = self.enabled();
        let menu_bar = &new_config.settings.menu_bar;
        self.icon.set_metrics(menu_bar.metrics);
        self.icon.set_occupancy_ttl(menu_bar.occupancy_ttl());
        self.preferences.replace(new_config.settings.preferences.clone());
        self.config = new_config;

        self.icon.invalidate();
        self.last_icon = None;
        if !self.enabled() {
            self.icon.end_preview();
            if was_enabled {
                self.notify(Notice::Hidden);
            }
            return;
        }
        self.refresh();
    }

    fn enabled(&self) -> bool { self.config.settings.menu_bar.enabled }

    fn refresh(&mut self) {
        if !self.enabled() {
            return;
        }
        let bitmap = self.icon.get_icon();
        self.publish(bitmap);
    }

    fn publish(&mut self, bitmap: Bitmap) {
        let unchanged = self
            .last_icon
            .as_ref()
            .is_some_and(|last| last.shares_pixels(&bitmap) || *last == bitmap);
        if unchanged {
            trace!("icon unchanged");
            return;
        }
        self.last_icon = Some(bitmap.clone());
        self.notify(Notice::Icon(bitmap));
    }

    fn notify(&self, notice: Notice) {
        if !self.notices.try_send(notice) {
            debug!("host stopped listening for menu bar notices");
        }
    }
}
