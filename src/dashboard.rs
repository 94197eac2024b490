// 🎛️ Dashboard
// Controls → handlers → outputs, with per-session state and history
//
// Each control is registered with exactly one handler and the list of
// outputs it recomputes. A handler only edits the session's control state
// and returns the selection to render; rendering and history are shared.

use crate::config::Variant;
use crate::history::{HistoryBatch, SelectionHistory};
use crate::indicators::{Indicator, IndicatorCatalog};
use crate::loader::AnnualTable;
use crate::selection::{PairOptions, Selection, SelectionModel, YearBounds};
use crate::view::{TableRow, ViewEngine, ViewResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// CONTROLS & OUTPUTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    YearRange,
    YearPair,
    Indicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Charts,
    Summary,
    ResultsTable,
    History,
    PairOptions,
}

/// ControlInput - one change of one control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlInput {
    YearRange { start: i32, end: i32 },
    YearPair { year_a: i32, year_b: i32 },
    Indicator { name: String },
}

impl ControlInput {
    pub fn control(&self) -> Control {
        match self {
            ControlInput::YearRange { .. } => Control::YearRange,
            ControlInput::YearPair { .. } => Control::YearPair,
            ControlInput::Indicator { .. } => Control::Indicator,
        }
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// Which year control was used last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Range,
    Pair,
}

/// ControlState - current value of every control in one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub range: (i32, i32),
    pub pair: (i32, i32),
    pub indicator: Option<String>,
    pub mode: Mode,
}

impl ControlState {
    /// Selection implied by the active mode
    pub fn selection(&self) -> Selection {
        let selection = match self.mode {
            Mode::Range => Selection::range(self.range.0, self.range.1),
            Mode::Pair => Selection::pair(self.pair.0, self.pair.1),
        };
        match &self.indicator {
            Some(name) => selection.with_indicator(name.clone()),
            None => selection,
        }
    }
}

/// DashboardSession - one viewer's controls and history; never shared
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub controls: ControlState,
    history: SelectionHistory,
}

impl DashboardSession {
    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }
}

// ============================================================================
// HANDLER REGISTRATION
// ============================================================================

type Handler = fn(&SelectionModel, &mut ControlState, &ControlInput) -> Selection;

struct Route {
    control: Control,
    handler: Handler,
    outputs: &'static [Output],
}

static ROUTES: [Route; 3] = [
    Route {
        control: Control::YearRange,
        handler: on_year_range,
        outputs: &[Output::Charts, Output::Summary, Output::ResultsTable, Output::History],
    },
    Route {
        control: Control::YearPair,
        handler: on_year_pair,
        outputs: &[
            Output::Charts,
            Output::Summary,
            Output::ResultsTable,
            Output::History,
            Output::PairOptions,
        ],
    },
    Route {
        control: Control::Indicator,
        handler: on_indicator,
        outputs: &[Output::Charts, Output::Summary, Output::ResultsTable, Output::History],
    },
];

fn route(control: Control) -> &'static Route {
    match control {
        Control::YearRange => &ROUTES[0],
        Control::YearPair => &ROUTES[1],
        Control::Indicator => &ROUTES[2],
    }
}

/// Outputs recomputed when `control` changes
pub fn outputs_for(control: Control) -> &'static [Output] {
    route(control).outputs
}

fn on_year_range(
    _model: &SelectionModel,
    state: &mut ControlState,
    input: &ControlInput,
) -> Selection {
    if let ControlInput::YearRange { start, end } = *input {
        state.range = (start, end);
        state.mode = Mode::Range;
    }
    state.selection()
}

fn on_year_pair(
    _model: &SelectionModel,
    state: &mut ControlState,
    input: &ControlInput,
) -> Selection {
    if let ControlInput::YearPair { year_a, year_b } = *input {
        state.pair = (year_a, year_b);
        state.mode = Mode::Pair;
    }
    state.selection()
}

/// Re-derives whichever year mode is active with the new indicator
///
/// Only a selectable indicator is kept. Any other name renders once, as a
/// placeholder, and the previous indicator stays in place.
fn on_indicator(
    model: &SelectionModel,
    state: &mut ControlState,
    input: &ControlInput,
) -> Selection {
    let ControlInput::Indicator { name } = input else {
        return state.selection();
    };

    match Indicator::resolve(name).filter(|i| model.selectable().contains(i)) {
        Some(indicator) => {
            state.indicator = Some(indicator.name().to_string());
            state.selection()
        }
        None => state.selection().with_indicator(name.clone()),
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// DashboardUpdate - everything one control change recomputed
///
/// Outputs not declared for the control are left as None.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardUpdate {
    pub session_id: Uuid,
    pub control: Control,
    pub outputs: Vec<Output>,
    pub view: ViewResult,
    /// History rows, newest batch first (the current batch leads)
    pub results: Option<Vec<TableRow>>,
    pub pair_options: Option<PairOptions>,
}

/// Dashboard - shared, read-only; sessions carry all mutable state
pub struct Dashboard {
    table: Arc<AnnualTable>,
    catalog: IndicatorCatalog,
    model: SelectionModel,
    variant: Variant,
}

impl Dashboard {
    pub fn new(table: Arc<AnnualTable>, catalog: IndicatorCatalog, variant: Variant) -> Self {
        let model = SelectionModel::new(table.bounds(), variant);
        Dashboard {
            table,
            catalog,
            model,
            variant,
        }
    }

    pub fn table(&self) -> &AnnualTable {
        &self.table
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn bounds(&self) -> YearBounds {
        self.model.bounds()
    }

    /// Fresh session: full range, first two years paired, default indicator
    pub fn new_session(&self) -> DashboardSession {
        let bounds = self.bounds();
        DashboardSession {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            controls: ControlState {
                range: (bounds.min_year, bounds.max_year),
                pair: (bounds.min_year, (bounds.min_year + 1).min(bounds.max_year)),
                indicator: self.variant.default_indicator().map(|i| i.name().to_string()),
                mode: Mode::Range,
            },
            history: SelectionHistory::new(),
        }
    }

    /// First render of a session, recorded like any range update
    pub fn start(&self, session: &mut DashboardSession) -> DashboardUpdate {
        let (start, end) = session.controls.range;
        self.handle(session, ControlInput::YearRange { start, end })
    }

    /// Stateless render of an arbitrary selection
    pub fn render(&self, selection: &Selection) -> ViewResult {
        ViewEngine::new(&self.table, &self.catalog).render(&self.model, selection)
    }

    pub fn pair_options(&self, year_a: i32) -> PairOptions {
        self.model.pair_options(year_a)
    }

    /// Dispatch one control change to its registered handler
    pub fn handle(&self, session: &mut DashboardSession, input: ControlInput) -> DashboardUpdate {
        let route = route(input.control());
        let selection = (route.handler)(&self.model, &mut session.controls, &input);
        let view = self.render(&selection);

        if let Some(batch) = HistoryBatch::from_view(&view) {
            session.history.record(batch);
        }

        debug!(
            session = %session.id,
            control = ?route.control,
            placeholder = view.is_placeholder(),
            history_batches = session.history.batch_count(),
            "control handled"
        );

        let declares = |output: Output| route.outputs.contains(&output);

        DashboardUpdate {
            session_id: session.id,
            control: route.control,
            outputs: route.outputs.to_vec(),
            results: declares(Output::ResultsTable).then(|| session.history.rows()),
            pair_options: declares(Output::PairOptions)
                .then(|| self.pair_options(session.controls.pair.0)),
            view,
        }
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

/// SessionStore - sessions keyed by id; ending one drops its history
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, DashboardSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: DashboardSession) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&DashboardSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut DashboardSession> {
        self.sessions.get_mut(id)
    }

    pub fn end(&mut self, id: &Uuid) -> Option<DashboardSession> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
