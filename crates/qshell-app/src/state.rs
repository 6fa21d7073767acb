// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use qshell_grid::Grid;
use qshell_scan::{CompletionCache, CompletionContext, Lookup, completion_context};

use crate::{Action, Envelope, Pagination, Panel, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub id: RequestId,
    pub page: u32,
    pub load_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Help,
    /// `names` is `None` until the server answers for `context.path`.
    Completions {
        context: CompletionContext,
        names: Option<Vec<String>>,
    },
}

/// Everything the shell knows. Only [`Session::dispatch`] changes it.
#[derive(Debug)]
pub struct Session {
    pub in_flight: Option<InFlight>,
    pub waiting: bool,
    pub last_request: RequestId,
    pub pagination: Option<Pagination>,
    pub result: Option<Envelope>,
    pub grid: Option<Grid>,
    pub panel: Panel,
    pub popup: Option<Popup>,
    pub completions: CompletionCache,
    pub completion_enabled: bool,
    pub scroll_offset: usize,
    pub status_line: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            in_flight: None,
            waiting: false,
            last_request: RequestId::new(0),
            pagination: None,
            result: None,
            grid: None,
            panel: Panel::Results,
            popup: None,
            completions: CompletionCache::new(),
            completion_enabled: true,
            scroll_offset: 0,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Run { query: String, action: Action },
    LoadMore,
    Finished { request_id: RequestId, envelope: Envelope },
    Failed { request_id: RequestId, error: String },
    WaitTimerFired { request_id: RequestId },
    /// `text` is the query up to the cursor.
    Complete { text: String },
    CompletionsArrived { path: Vec<String>, names: Vec<String> },
    CompletionsFailed { path: Vec<String>, error: String },
    ShowPanel(Panel),
    ClosePopup,
    ToggleHelp,
    Scrolled { offset: usize },
    ClearStatus,
}

/// Side effects for the runtime to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Evaluate {
        request_id: RequestId,
        query: String,
        action: Action,
        page: u32,
    },
    ArmWaitTimer { request_id: RequestId },
    RestoreScroll { offset: usize },
    FetchCompletions { path: Vec<String> },
    ShowCompletions { start: usize, names: Vec<String> },
    StatusUpdated(String),
    StatusCleared,
}

impl Session {
    pub fn new(completion_enabled: bool) -> Self {
        Self {
            completion_enabled,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn dispatch(&mut self, command: ShellCommand) -> Vec<Effect> {
        match command {
            ShellCommand::Run { query, action } => self.run(query, action),
            ShellCommand::LoadMore => self.load_more(),
            ShellCommand::Finished {
                request_id,
                envelope,
            } => self.finish(request_id, Ok(envelope)),
            ShellCommand::Failed { request_id, error } => self.finish(request_id, Err(error)),
            ShellCommand::WaitTimerFired { request_id } => {
                if self.in_flight.is_some_and(|flight| flight.id == request_id) {
                    self.waiting = true;
                }
                Vec::new()
            }
            ShellCommand::Complete { text } => self.complete(&text),
            ShellCommand::CompletionsArrived { path, names } => {
                self.completions.fill(&path, names);
                self.show_waiting_completions(&path)
            }
            ShellCommand::CompletionsFailed { path, error } => {
                log::warn!("completion lookup for {path:?} failed: {error}");
                self.completions.fail(&path);
                if self.waiting_popup_path() == Some(&path) {
                    self.popup = None;
                    return vec![self.set_status(&format!("completion failed: {error}"))];
                }
                Vec::new()
            }
            ShellCommand::ShowPanel(panel) => {
                self.panel = panel;
                Vec::new()
            }
            ShellCommand::ClosePopup => {
                self.popup = None;
                Vec::new()
            }
            ShellCommand::ToggleHelp => {
                self.popup = match self.popup {
                    Some(Popup::Help) => None,
                    _ => Some(Popup::Help),
                };
                Vec::new()
            }
            ShellCommand::Scrolled { offset } => {
                self.scroll_offset = offset;
                Vec::new()
            }
            ShellCommand::ClearStatus => {
                self.status_line = None;
                vec![Effect::StatusCleared]
            }
        }
    }

    fn run(&mut self, query: String, action: Action) -> Vec<Effect> {
        if self.is_running() {
            return vec![self.set_status("a query is already running")];
        }
        self.pagination = Some(Pagination::first(&query, action));
        self.start(query, action, 1, false)
    }

    fn load_more(&mut self) -> Vec<Effect> {
        if self.is_running() {
            return vec![self.set_status("a query is already running")];
        }
        let more = self.result.as_ref().is_some_and(Envelope::has_more);
        let Some(pagination) = self.pagination.as_mut().filter(|_| more) else {
            return vec![self.set_status("no more rows to load")];
        };
        pagination.scroll_offset = self.scroll_offset;
        let (query, action, page) = (pagination.query.clone(), pagination.action, pagination.page + 1);
        self.start(query, action, page, true)
    }

    fn start(&mut self, query: String, action: Action, page: u32, load_more: bool) -> Vec<Effect> {
        let request_id = self.last_request.next();
        self.last_request = request_id;
        self.in_flight = Some(InFlight {
            id: request_id,
            page,
            load_more,
        });
        self.waiting = false;
        log::debug!("evaluating request {} page {page}", request_id.get());
        vec![
            Effect::Evaluate {
                request_id,
                query,
                action,
                page,
            },
            Effect::ArmWaitTimer { request_id },
        ]
    }

    fn finish(&mut self, request_id: RequestId, outcome: Result<Envelope, String>) -> Vec<Effect> {
        let Some(flight) = self.in_flight.filter(|flight| flight.id == request_id) else {
            log::warn!("dropping response for stale request {}", request_id.get());
            return Vec::new();
        };
        self.in_flight = None;
        self.waiting = false;

        let envelope = match outcome {
            Ok(envelope) => envelope,
            Err(error) => {
                self.panel = Panel::Error;
                self.result = Some(Envelope::Error {
                    detail: error,
                    hint: None,
                });
                self.grid = None;
                return vec![self.set_status("request failed")];
            }
        };

        if let Some(pagination) = self.pagination.as_mut() {
            pagination.page = flight.page;
        }
        self.panel = envelope.panel();
        self.grid = None;
        let mut effects = Vec::new();
        if let Envelope::Product(product) = &envelope {
            match product.grid() {
                Ok(grid) => self.grid = Some(grid),
                Err(error) => {
                    self.panel = Panel::Error;
                    self.result = Some(Envelope::Error {
                        detail: format!("{error:#}"),
                        hint: None,
                    });
                    return vec![self.set_status("result does not match its profile")];
                }
            }
        }
        self.result = Some(envelope);

        if flight.load_more {
            let offset = self
                .pagination
                .as_ref()
                .map_or(0, |pagination| pagination.scroll_offset);
            self.scroll_offset = offset;
            effects.push(Effect::RestoreScroll { offset });
        } else {
            self.scroll_offset = 0;
        }
        effects
    }

    fn complete(&mut self, text: &str) -> Vec<Effect> {
        if !self.completion_enabled {
            return Vec::new();
        }
        let Some(context) = completion_context(text) else {
            return Vec::new();
        };
        match self.completions.lookup(&context.path) {
            Lookup::Ready(names) => {
                let names = context.matching(names);
                self.offer(context, names)
            }
            Lookup::Pending => {
                self.popup = Some(Popup::Completions {
                    context,
                    names: None,
                });
                Vec::new()
            }
            Lookup::Fetch => {
                let path = context.path.clone();
                self.popup = Some(Popup::Completions {
                    context,
                    names: None,
                });
                vec![Effect::FetchCompletions { path }]
            }
        }
    }

    fn offer(&mut self, context: CompletionContext, names: Vec<String>) -> Vec<Effect> {
        if names.is_empty() {
            self.popup = None;
            return vec![self.set_status("no completions")];
        }
        let start = context.start;
        self.popup = Some(Popup::Completions {
            context,
            names: Some(names.clone()),
        });
        vec![Effect::ShowCompletions { start, names }]
    }

    fn waiting_popup_path(&self) -> Option<&Vec<String>> {
        match &self.popup {
            Some(Popup::Completions {
                context,
                names: None,
            }) => Some(&context.path),
            _ => None,
        }
    }

    fn show_waiting_completions(&mut self, path: &[String]) -> Vec<Effect> {
        if self.waiting_popup_path().map(Vec::as_slice) != Some(path) {
            return Vec::new();
        }
        let Some(Popup::Completions { context, .. }) = self.popup.take() else {
            return Vec::new();
        };
        let names = self
            .completions
            .get(path)
            .map(|names| context.matching(names))
            .unwrap_or_default();
        self.offer(context, names)
    }

    fn set_status(&mut self, message: &str) -> Effect {
        self.status_line = Some(message.to_owned());
        Effect::StatusUpdated(message.to_owned())
    }
}
