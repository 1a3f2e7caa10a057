//! The selection state machine.
//!
//! [`DatePicker`] owns a [`SelectionState`] and maps raw input events to
//! state transitions through a single entry point,
//! [`handle`](DatePicker::handle). The engine never performs side effects
//! itself; every transition returns the [`Effect`]s the host must
//! interpret. The current instant is passed in with each event, so the
//! machine is fully deterministic under test.

mod state;

use chrono::{DateTime, TimeZone, Weekday};
use log::debug;

pub use state::{ChangeOrigin, SelectionState};

use crate::calendar::{
    add_days, add_months, add_weeks, day_before, day_in_range, end_of_day, end_of_week,
    graft_time, is_after, is_before, resolve_local, same_day, same_instant_opt, set_time,
    start_of_day, start_of_week, sub_days, sub_months, sub_weeks,
};
use crate::constraints::{
    DateConstraints, TimeConstraints, day_disabled, effective_max_date, effective_min_date,
    month_disabled, quarter_disabled, time_disabled, time_in_disabled_range, year_disabled,
};
use crate::format::{parse_date, safe_format, safe_range_format};
use crate::locale::{LocaleRegistry, LocaleSpec};
use chronopick_proto::config::{ConfigValidationError, DateFormats, PickerConfig, SelectionMode};
use chronopick_proto::ports::host::{Effect, Key, PickerEvent, SelectionChange};

const INPUT_ERROR_CODE: u8 = 1;
const INPUT_ERROR_MESSAGE: &str = "Date input not valid.";

/// Resolved runtime context for one picker instance: the declarative
/// configuration materialized in a timezone, plus runtime capabilities
/// (locale registry, custom filters).
#[derive(Debug, Clone)]
pub struct PickerContext<Tz: TimeZone> {
    pub mode: SelectionMode,
    pub formats: DateFormats,
    pub locale: Option<LocaleSpec>,
    pub registry: LocaleRegistry,
    pub strict_parsing: bool,
    pub dates: DateConstraints<Tz>,
    pub times: TimeConstraints<Tz>,
    pub week_starts_on: Weekday,
    pub year_item_number: u32,
    pub time_intervals: u32,
    pub inline: bool,
    pub close_on_select: bool,
    pub close_on_scroll: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub disabled_keyboard_navigation: bool,
    pub adjust_date_on_change: bool,
    pub allow_same_day: bool,
    pub prevent_open_on_focus: bool,
    pub start_open: bool,
    pub time_only: bool,
    pub open_to: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> PickerContext<Tz> {
    /// Builds a context from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] when the configuration is
    /// internally inconsistent.
    pub fn from_config(
        config: &PickerConfig,
        tz: &Tz,
        registry: LocaleRegistry,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;

        let locale = config.locale.as_deref().map(LocaleSpec::from);
        let week_starts_on = config
            .week_starts_on
            .or_else(|| {
                registry
                    .resolve(locale.as_ref())
                    .or_else(|| registry.resolve_default())
                    .map(|resolved| resolved.week_starts_on)
            })
            .unwrap_or(Weekday::Sun);

        Ok(Self {
            mode: config.mode,
            formats: config.date_format.clone(),
            locale,
            registry,
            strict_parsing: config.strict_parsing,
            dates: DateConstraints::from_config(config, tz),
            times: TimeConstraints::from_config(config, tz),
            week_starts_on,
            year_item_number: config.year_item_number,
            time_intervals: config.time_intervals,
            inline: config.inline,
            close_on_select: config.close_on_select,
            close_on_scroll: config.close_on_scroll,
            disabled: config.disabled,
            read_only: config.read_only,
            disabled_keyboard_navigation: config.disabled_keyboard_navigation,
            adjust_date_on_change: config.adjust_date_on_change,
            allow_same_day: config.allow_same_day,
            prevent_open_on_focus: config.prevent_open_on_focus,
            start_open: config.start_open,
            time_only: config.time_only,
            open_to: config
                .open_to
                .map(|date| resolve_local(tz, date.and_time(chrono::NaiveTime::MIN))),
        })
    }

    /// Attaches a custom day-acceptance predicate.
    pub fn with_filter_date(
        mut self,
        filter: impl Fn(&DateTime<Tz>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.dates.filter_date = Some(std::sync::Arc::new(filter));
        self
    }

    /// Attaches a custom time-acceptance predicate.
    pub fn with_filter_time(
        mut self,
        filter: impl Fn(&DateTime<Tz>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.times.filter_time = Some(std::sync::Arc::new(filter));
        self
    }
}

/// The selection state machine. See the module docs for the event model.
#[derive(Debug, Clone)]
pub struct DatePicker<Tz: TimeZone> {
    ctx: PickerContext<Tz>,
    state: SelectionState<Tz>,
}

impl<Tz: TimeZone> DatePicker<Tz> {
    pub fn new(ctx: PickerContext<Tz>, now: &DateTime<Tz>) -> Self {
        Self::with_selection(ctx, None, None, None, now)
    }

    /// Starts from an externally supplied committed value.
    pub fn with_selected(
        ctx: PickerContext<Tz>,
        selected: Option<DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> Self {
        Self::with_selection(ctx, selected, None, None, now)
    }

    /// Starts from an externally supplied range.
    pub fn with_range(
        ctx: PickerContext<Tz>,
        start: Option<DateTime<Tz>>,
        end: Option<DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> Self {
        Self::with_selection(ctx, None, start, end, now)
    }

    fn with_selection(
        ctx: PickerContext<Tz>,
        selected: Option<DateTime<Tz>>,
        range_start: Option<DateTime<Tz>>,
        range_end: Option<DateTime<Tz>>,
        now: &DateTime<Tz>,
    ) -> Self {
        let mut picker = Self {
            state: SelectionState {
                selected,
                range_start,
                range_end,
                open: ctx.start_open || ctx.inline,
                ..SelectionState::default()
            },
            ctx,
        };

        picker.state.pre_selection = Some(picker.initial_pre_selection(now));
        picker
    }

    /// The current state snapshot, for rendering.
    pub fn state(&self) -> &SelectionState<Tz> {
        &self.state
    }

    pub fn context(&self) -> &PickerContext<Tz> {
        &self.ctx
    }

    /// The text the input widget should display: the raw buffer while the
    /// user is editing, otherwise the formatted committed value.
    pub fn display_text(&self) -> String {
        if let Some(buffer) = &self.state.input_buffer {
            return buffer.clone();
        }

        if self.ctx.mode.is_range() {
            safe_range_format(
                self.state.range_start.as_ref(),
                self.state.range_end.as_ref(),
                &self.ctx.formats,
                &self.ctx.registry,
                self.ctx.locale.as_ref(),
            )
        } else {
            safe_format(
                self.state.selected.as_ref(),
                &self.ctx.formats,
                &self.ctx.registry,
                self.ctx.locale.as_ref(),
            )
        }
    }

    /// Processes one event to completion and returns the effects the host
    /// must interpret.
    pub fn handle(&mut self, event: PickerEvent<Tz>, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        match event {
            PickerEvent::InputClicked => self.on_input_click(now),
            PickerEvent::FocusGained => self.on_focus(now),
            PickerEvent::FocusLost => {
                self.state.focused = false;
                Vec::new()
            }
            PickerEvent::InputChanged(text) => self.on_input_change(&text, now),
            PickerEvent::KeyPressed(key) => self.on_input_key(key, now),
            PickerEvent::CellKeyPressed(key) => self.on_cell_key(key, now),
            PickerEvent::CellActivated { instant, unit: _ } => {
                self.commit_selection(instant, now)
            }
            PickerEvent::TimeSelected(time) => self.on_time_selected(time, now),
            PickerEvent::OutsideClick => {
                if self.ctx.inline {
                    Vec::new()
                } else {
                    self.set_open(false, now)
                }
            }
            PickerEvent::Scrolled => {
                if self.ctx.close_on_scroll {
                    self.set_open(false, now)
                } else {
                    Vec::new()
                }
            }
            PickerEvent::ClearRequested => self.on_clear(),
            PickerEvent::OpenRequested => self.set_open(true, now),
            PickerEvent::CloseRequested => self.set_open(false, now),
            PickerEvent::SetPreSelection(date) => {
                self.set_pre_selection(date);
                Vec::new()
            }
        }
    }

    // ** Pre-selection defaults **

    /// The bounded default cursor: the open-to date, else now, clamped into
    /// the effective bounds.
    fn bounded_default(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let default = self.ctx.open_to.clone().unwrap_or_else(|| now.clone());
        let min = effective_min_date(&self.ctx.dates);
        let max = effective_max_date(&self.ctx.dates);

        if let Some(min) = min {
            if is_before(&default, &start_of_day(&min)) {
                return min;
            }
        }

        if let Some(max) = max {
            if is_after(&default, &end_of_day(&max)) {
                return max;
            }
        }

        default
    }

    fn initial_pre_selection(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let anchor = if self.ctx.mode.is_range() {
            self.state.range_start.clone()
        } else {
            self.state.selected.clone()
        };

        anchor.unwrap_or_else(|| self.bounded_default(now))
    }

    fn input_ok(&self) -> bool {
        self.state.pre_selection.is_some()
    }

    fn input_error() -> Effect<Tz> {
        Effect::InputError {
            code: INPUT_ERROR_CODE,
            message: INPUT_ERROR_MESSAGE,
        }
    }

    // ** Open / close **

    fn set_open(&mut self, open: bool, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        let mut effects = Vec::new();

        if open == self.state.open {
            return effects;
        }

        self.state.open = open;
        self.state.last_change_origin = ChangeOrigin::Navigate;
        self.state.pre_selection = Some(self.initial_pre_selection(now));

        if open {
            effects.push(Effect::CalendarOpened);
        } else {
            self.state.focused = false;
            self.state.input_buffer = None;
            effects.push(Effect::CalendarClosed);
        }

        effects
    }

    fn on_input_click(&mut self, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        if self.ctx.disabled || self.ctx.read_only {
            return Vec::new();
        }

        self.set_open(true, now)
    }

    fn on_focus(&mut self, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        self.state.focused = true;

        // A focus-changing event supersedes any still-pending refocus.
        let mut effects = vec![Effect::CancelRefocus];

        if !self.ctx.prevent_open_on_focus && !self.ctx.read_only && !self.ctx.disabled {
            effects.extend(self.set_open(true, now));
        }

        effects
    }

    // ** Typed input **

    fn on_input_change(&mut self, text: &str, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        self.state.input_buffer = Some(text.to_owned());
        self.state.last_change_origin = ChangeOrigin::Input;

        let mut date = parse_date(
            text,
            &self.ctx.formats,
            now,
            &self.ctx.registry,
            self.ctx.locale.as_ref(),
            self.ctx.strict_parsing,
            self.ctx.dates.min_date.as_ref(),
        );

        // When only the time is being edited, keep the day of the committed
        // selection and take just the wall clock from the typed value.
        if self.ctx.time_only {
            let grafted = match (&self.state.selected, &date) {
                (Some(selected), Some(parsed)) if !same_day(parsed, selected) => {
                    Some(graft_time(selected, parsed))
                }
                _ => None,
            };

            if grafted.is_some() {
                date = grafted;
            }
        }

        if date.is_none() && !text.is_empty() {
            return Vec::new();
        }

        if self.ctx.mode == SelectionMode::WeekOnly {
            date = date.map(|parsed| start_of_week(&parsed, self.ctx.week_starts_on));
        }

        let mut effects = Vec::new();
        self.set_selected(date, true, &mut effects);
        effects
    }

    // ** Commit **

    fn candidate_disabled(&self, date: &DateTime<Tz>) -> bool {
        match self.ctx.mode {
            SelectionMode::YearOnly => year_disabled(date, &self.ctx.dates),
            SelectionMode::MonthOnly => month_disabled(date, &self.ctx.dates),
            SelectionMode::QuarterOnly => quarter_disabled(date, &self.ctx.dates),
            _ => day_disabled(date, &self.ctx.dates),
        }
    }

    /// Full commit path for an activated cell or an Enter on the cursor:
    /// validation, selection update, refocus and close handling. A disabled
    /// candidate is a pure no-op.
    fn commit_selection(&mut self, date: DateTime<Tz>, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        let date = if self.ctx.mode == SelectionMode::WeekOnly {
            start_of_week(&date, self.ctx.week_starts_on)
        } else {
            date
        };

        if self.candidate_disabled(&date) {
            debug!("rejected disabled candidate {date:?}");
            return Vec::new();
        }

        let mut effects = Vec::new();
        let shows_time = self.ctx.mode.is_time_bearing();

        if self.ctx.close_on_select && !shows_time {
            effects.push(Effect::ScheduleRefocus);
        }

        // Close decisions look at the range as it was before this commit.
        let previous_start = self.state.range_start.clone();
        let previous_end = self.state.range_end.clone();

        self.set_selected(Some(date.clone()), false, &mut effects);

        if !self.ctx.close_on_select || shows_time {
            self.set_pre_selection(date);
        } else if !self.ctx.inline {
            if !self.ctx.mode.is_range() {
                effects.extend(self.set_open(false, now));
            } else if let (Some(start), None) = (previous_start, previous_end) {
                if !day_before(&date, &start) {
                    effects.extend(self.set_open(false, now));
                }
            }
        }

        effects
    }

    /// Validates and applies a candidate. A disabled candidate is silently
    /// dropped: no state change, no effects.
    fn set_selected(
        &mut self,
        candidate: Option<DateTime<Tz>>,
        keep_input: bool,
        effects: &mut Vec<Effect<Tz>>,
    ) {
        if let Some(date) = &candidate {
            if self.candidate_disabled(date) {
                debug!("rejected disabled candidate {date:?}");
                return;
            }
        }

        let mut changed_date = candidate;
        let is_range = self.ctx.mode.is_range();
        let selection_changed =
            !same_instant_opt(self.state.selected.as_ref(), changed_date.as_ref());

        if selection_changed || self.ctx.allow_same_day || is_range {
            if let Some(date) = changed_date.take() {
                let date = if self.state.selected.is_some()
                    && (!keep_input || !self.ctx.mode.is_time_bearing())
                {
                    // A date-only commit keeps the previously selected
                    // time-of-day.
                    match &self.state.selected {
                        Some(selected) => graft_time(&date, selected),
                        None => date,
                    }
                } else {
                    date
                };

                if !self.ctx.inline {
                    self.state.pre_selection = Some(date.clone());
                }

                changed_date = Some(date);
            }

            if is_range {
                self.apply_range_transition(changed_date.clone(), effects);
            } else {
                self.state.selected = changed_date.clone();
                effects.push(Effect::SelectionChanged(SelectionChange::Single(
                    changed_date.clone(),
                )));
            }
        }

        if !keep_input {
            effects.push(Effect::SelectionCommitted(changed_date));
            self.state.input_buffer = None;
        }
    }

    /// Range rules: an empty range gains a start; a half-open range gains
    /// an end, unless the candidate is chronologically before the start, in
    /// which case it becomes the new start; a filled range restarts.
    fn apply_range_transition(
        &mut self,
        candidate: Option<DateTime<Tz>>,
        effects: &mut Vec<Effect<Tz>>,
    ) {
        let Some(date) = candidate else {
            self.state.range_start = None;
            self.state.range_end = None;
            effects.push(Effect::SelectionChanged(SelectionChange::Range {
                start: None,
                end: None,
            }));
            return;
        };

        let (start, end) = match (self.state.range_start.clone(), self.state.range_end.clone()) {
            (None, _) => (Some(date), None),
            (Some(start), None) => {
                if day_before(&date, &start) {
                    (Some(date), None)
                } else {
                    (Some(start), Some(date))
                }
            }
            (Some(_), Some(_)) => (Some(date), None),
        };

        self.state.range_start = start.clone();
        self.state.range_end = end.clone();
        effects.push(Effect::SelectionChanged(SelectionChange::Range {
            start,
            end,
        }));
    }

    // ** Pre-selection updates **

    /// Moves the cursor if the candidate lies within the raw min/max
    /// bounds; out-of-bounds candidates leave it untouched.
    fn set_pre_selection(&mut self, date: DateTime<Tz>) {
        let date = if self.ctx.mode == SelectionMode::WeekOnly {
            start_of_week(&date, self.ctx.week_starts_on)
        } else {
            date
        };

        let valid = match (&self.ctx.dates.min_date, &self.ctx.dates.max_date) {
            (Some(min), Some(max)) => day_in_range(&date, min, max),
            (Some(min), None) => {
                is_after(&date, &start_of_day(min)) || start_of_day(&date) == start_of_day(min)
            }
            (None, Some(max)) => {
                is_before(&date, &end_of_day(max)) || start_of_day(&date) == end_of_day(max)
            }
            (None, None) => true,
        };

        if valid {
            self.state.pre_selection = Some(date);
        }
    }

    // ** Keyboard **

    fn on_input_key(&mut self, key: Key, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        if !self.state.open {
            if !self.ctx.inline
                && !self.ctx.prevent_open_on_focus
                && matches!(key, Key::ArrowDown | Key::ArrowUp | Key::Enter)
            {
                return self.on_input_click(now);
            }

            return Vec::new();
        }

        let mut effects = Vec::new();

        match key {
            // The host moves DOM focus into the calendar grid; no state
            // change here.
            Key::ArrowDown | Key::ArrowUp => {}
            Key::Enter => {
                let navigated = self.state.last_change_origin == ChangeOrigin::Navigate;

                match self.state.pre_selection.clone() {
                    Some(cursor) if navigated => {
                        effects.extend(self.commit_selection(cursor.clone(), now));
                        if !self.ctx.close_on_select {
                            self.set_pre_selection(cursor);
                        }
                    }
                    _ => effects.extend(self.set_open(false, now)),
                }
            }
            Key::Escape => {
                effects.push(Effect::ScheduleRefocus);
                effects.extend(self.set_open(false, now));
            }
            Key::Tab => {
                effects.extend(self.set_open(false, now));
            }
            _ => {}
        }

        if !self.input_ok() {
            effects.push(Self::input_error());
        }

        effects
    }

    fn on_cell_key(&mut self, key: Key, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        let Some(cursor) = self.state.pre_selection.clone() else {
            return vec![Self::input_error()];
        };

        let mut effects = Vec::new();

        match key {
            Key::Enter => {
                effects.extend(self.commit_selection(cursor.clone(), now));
                if !self.ctx.close_on_select {
                    self.set_pre_selection(cursor);
                }
            }
            Key::Escape => {
                effects.extend(self.set_open(false, now));
            }
            _ if self.ctx.disabled_keyboard_navigation => {}
            _ => {
                let week_mode = self.ctx.mode == SelectionMode::WeekOnly;
                let new_selection = match key {
                    Key::ArrowLeft if week_mode => sub_weeks(&cursor, 1),
                    Key::ArrowLeft => sub_days(&cursor, 1),
                    Key::ArrowRight if week_mode => add_weeks(&cursor, 1),
                    Key::ArrowRight => add_days(&cursor, 1),
                    Key::ArrowUp => sub_weeks(&cursor, 1),
                    Key::ArrowDown => add_weeks(&cursor, 1),
                    Key::PageUp => sub_months(&cursor, 1),
                    Key::PageDown => add_months(&cursor, 1),
                    Key::Home => start_of_week(&cursor, self.ctx.week_starts_on),
                    Key::End => end_of_week(&cursor, self.ctx.week_starts_on),
                    _ => return vec![Self::input_error()],
                };

                self.state.last_change_origin = ChangeOrigin::Navigate;

                if self.ctx.adjust_date_on_change {
                    self.set_selected(Some(new_selection.clone()), false, &mut effects);
                }

                self.set_pre_selection(new_selection);
            }
        }

        effects
    }

    // ** Time list **

    fn on_time_selected(&mut self, time: DateTime<Tz>, now: &DateTime<Tz>) -> Vec<Effect<Tz>> {
        if time_disabled(&time, &self.ctx.times) {
            debug!("rejected disabled time candidate");
            return Vec::new();
        }

        if self.ctx.times.min_time.is_some()
            && self.ctx.times.max_time.is_some()
            && time_in_disabled_range(&time, &self.ctx.times)
        {
            debug!("rejected out-of-range time candidate");
            return Vec::new();
        }

        let changed = match &self.state.selected {
            Some(_) => time,
            None => {
                let base = self.ctx.open_to.clone().unwrap_or_else(|| now.clone());
                set_time(&base, time.time())
            }
        };

        self.state.selected = Some(changed.clone());
        self.state.pre_selection = Some(changed.clone());
        self.state.input_buffer = None;

        let mut effects = vec![Effect::SelectionChanged(SelectionChange::Single(Some(
            changed,
        )))];

        if self.ctx.close_on_select && !self.ctx.time_only {
            effects.push(Effect::ScheduleRefocus);
            effects.extend(self.set_open(false, now));
        }

        effects
    }

    // ** Clear **

    /// Unconditionally resets the selection, bypassing constraint checks.
    fn on_clear(&mut self) -> Vec<Effect<Tz>> {
        let mut effects = vec![Effect::ScheduleRefocus];

        if self.ctx.mode.is_range() {
            self.state.range_start = None;
            self.state.range_end = None;
            effects.push(Effect::SelectionChanged(SelectionChange::Range {
                start: None,
                end: None,
            }));
        } else {
            self.state.selected = None;
            effects.push(Effect::SelectionChanged(SelectionChange::Single(None)));
        }

        self.state.input_buffer = None;
        effects
    }
}
