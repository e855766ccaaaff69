use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const DEFAULT_CARD_WIDTH: f64 = 200.0;
pub const DEFAULT_CARD_HEIGHT: f64 = 120.0;
/// Circles keep a square bounding box.
pub const DEFAULT_CIRCLE_SIZE: f64 = 160.0;
pub const MIN_CARD_SIZE: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardKind {
    #[default]
    Task,
    Note,
    Media,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardShape {
    #[default]
    Rectangle,
    Circle,
    Hexagon,
    Diamond,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardColor {
    Red,
    Yellow,
    Purple,
    Blue,
    Green,
    #[default]
    Gray,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub kind: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaneElement {
    pub id: Uuid,
    pub kind: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiThought {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Whether the visual timer drains from full or fills toward full.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimerFillMode {
    #[default]
    Drain,
    Fill,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntervalPlan {
    pub count: u32,
    /// Seconds per interval.
    pub duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: Uuid,
    pub kind: CardKind,
    pub title: String,
    pub description: String,
    pub tags: HashSet<String>,
    pub attachments: Vec<Attachment>,
    pub panes: Vec<PaneElement>,
    pub ai_thoughts: Vec<AiThought>,

    // Geometry (world units, top-left origin)
    pub position: Position,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub aspect_ratio: Option<f64>,

    // Hierarchy: parent is a reference, not containment. A dangling
    // parent_id is tolerated and treated as "no parent" during traversal.
    pub parent_id: Option<Uuid>,
    pub is_expanded: bool,
    pub is_internal: bool,

    // Status
    pub status: CardStatus,
    pub completion_count: u32,
    pub incomplete_count: u32,
    pub micro_task_count: u32,
    pub target_micro_tasks: u32,
    pub failure_count: u32,
    pub progress: f64,
    pub last_completed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    // Timing (seconds)
    pub timer_total: u32,
    pub timer_remaining: u32,
    pub timer_fill_mode: TimerFillMode,
    pub pre_time_seconds: Option<u32>,
    pub post_time_seconds: Option<u32>,
    pub intervals: Option<IntervalPlan>,
    pub current_interval: u32,
    pub reminder_hours: Option<f64>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub alarm_played: bool,

    // Visual
    pub shape: CardShape,
    pub color: CardColor,
    pub visual_override: Option<HashMap<String, String>>,
}

impl Default for Card {
    fn default() -> Self {
        Self::new(String::new(), CardKind::Task)
    }
}

impl Card {
    pub fn new(title: String, kind: CardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title,
            description: String::new(),
            tags: HashSet::new(),
            attachments: Vec::new(),
            panes: Vec::new(),
            ai_thoughts: Vec::new(),
            position: Position::default(),
            width: None,
            height: None,
            aspect_ratio: None,
            parent_id: None,
            is_expanded: true,
            is_internal: false,
            status: CardStatus::Pending,
            completion_count: 0,
            incomplete_count: 0,
            micro_task_count: 0,
            target_micro_tasks: 0,
            failure_count: 0,
            progress: 0.0,
            last_completed: None,
            created_at: Utc::now(),
            timer_total: 0,
            timer_remaining: 0,
            timer_fill_mode: TimerFillMode::Drain,
            pre_time_seconds: None,
            post_time_seconds: None,
            intervals: None,
            current_interval: 0,
            reminder_hours: None,
            scheduled_start: None,
            scheduled_end: None,
            alarm_played: false,
            shape: CardShape::Rectangle,
            color: CardColor::Gray,
            visual_override: None,
        }
    }

    pub fn new_note(title: String) -> Self {
        Self::new(title, CardKind::Note)
    }

    /// Effective width/height after shape defaults are applied.
    pub fn bounds(&self) -> (f64, f64) {
        let (dw, dh) = match self.shape {
            CardShape::Circle => (DEFAULT_CIRCLE_SIZE, DEFAULT_CIRCLE_SIZE),
            _ => (DEFAULT_CARD_WIDTH, DEFAULT_CARD_HEIGHT),
        };
        (self.width.unwrap_or(dw), self.height.unwrap_or(dh))
    }

    pub fn center(&self) -> Position {
        let (w, h) = self.bounds();
        Position::new(self.position.x + w / 2.0, self.position.y + h / 2.0)
    }

    pub fn contains(&self, point: Position) -> bool {
        let (w, h) = self.bounds();
        point.x >= self.position.x
            && point.x <= self.position.x + w
            && point.y >= self.position.y
            && point.y <= self.position.y + h
    }

    pub fn add_tag(&mut self, tag: String) {
        self.tags.insert(tag);
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn append_thought(&mut self, content: String) {
        self.ai_thoughts.push(AiThought {
            timestamp: Utc::now(),
            content,
        });
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.scheduled_end {
            Some(end) => end < now && self.status != CardStatus::Completed,
            None => false,
        }
    }

    /// True when the card has a micro-task target it has not yet reached.
    pub fn has_unmet_micro_target(&self) -> bool {
        self.target_micro_tasks > 0 && self.micro_task_count < self.target_micro_tasks
    }
}

/// Shallow-merge update applied to an existing card. `None` fields are left
/// untouched; double-`Option` fields can clear their target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<Position>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub aspect_ratio: Option<Option<f64>>,
    pub parent_id: Option<Option<Uuid>>,
    pub is_expanded: Option<bool>,
    pub is_internal: Option<bool>,
    pub status: Option<CardStatus>,
    pub target_micro_tasks: Option<u32>,
    pub timer_total: Option<u32>,
    pub timer_remaining: Option<u32>,
    pub timer_fill_mode: Option<TimerFillMode>,
    pub intervals: Option<Option<IntervalPlan>>,
    pub reminder_hours: Option<Option<f64>>,
    pub scheduled_start: Option<Option<DateTime<Utc>>>,
    pub scheduled_end: Option<Option<DateTime<Utc>>>,
    pub alarm_played: Option<bool>,
    pub tags: Option<HashSet<String>>,
    pub panes: Option<Vec<PaneElement>>,
    pub shape: Option<CardShape>,
    pub color: Option<CardColor>,
    pub progress: Option<f64>,
}

impl CardPatch {
    /// Applies the patch. Returns true when title, description, or pane text
    /// changed, which is the trigger for re-running the command parser.
    pub fn apply(self, card: &mut Card) -> bool {
        let mut text_changed = false;

        if let Some(title) = self.title {
            text_changed |= title != card.title;
            card.title = title;
        }
        if let Some(description) = self.description {
            text_changed |= description != card.description;
            card.description = description;
        }
        if let Some(panes) = self.panes {
            text_changed |= panes != card.panes;
            card.panes = panes;
        }
        if let Some(position) = self.position {
            card.position = position;
        }
        if let Some(width) = self.width {
            card.width = Some(width);
        }
        if let Some(height) = self.height {
            card.height = Some(height);
        }
        if let Some(aspect_ratio) = self.aspect_ratio {
            card.aspect_ratio = aspect_ratio;
        }
        if let Some(parent_id) = self.parent_id {
            card.parent_id = parent_id;
        }
        if let Some(is_expanded) = self.is_expanded {
            card.is_expanded = is_expanded;
        }
        if let Some(is_internal) = self.is_internal {
            card.is_internal = is_internal;
        }
        if let Some(status) = self.status {
            card.status = status;
        }
        if let Some(target) = self.target_micro_tasks {
            card.target_micro_tasks = target;
        }
        if let Some(timer_total) = self.timer_total {
            card.timer_total = timer_total;
        }
        if let Some(timer_remaining) = self.timer_remaining {
            card.timer_remaining = timer_remaining;
        }
        if let Some(timer_fill_mode) = self.timer_fill_mode {
            card.timer_fill_mode = timer_fill_mode;
        }
        if let Some(intervals) = self.intervals {
            card.intervals = intervals;
        }
        if let Some(reminder_hours) = self.reminder_hours {
            card.reminder_hours = reminder_hours;
        }
        if let Some(scheduled_start) = self.scheduled_start {
            card.scheduled_start = scheduled_start;
        }
        if let Some(scheduled_end) = self.scheduled_end {
            card.scheduled_end = scheduled_end;
        }
        if let Some(alarm_played) = self.alarm_played {
            card.alarm_played = alarm_played;
        }
        if let Some(tags) = self.tags {
            card.tags = tags;
        }
        if let Some(shape) = self.shape {
            card.shape = shape;
        }
        if let Some(color) = self.color {
            card.color = color;
        }
        if let Some(progress) = self.progress {
            card.progress = progress;
        }

        // Remaining time never exceeds the configured total.
        if card.timer_remaining > card.timer_total {
            card.timer_remaining = card.timer_total;
        }

        text_changed
    }
}
