use serde::{Deserialize, Serialize};

use fixchain_core::{Device, GuideRef, GuideSummary, Message, RepairContent};

use crate::GraphError;

/// Everything one pipeline run knows. Created per request and owned by that run.
///
/// Optional fields go from unset to set at most once; nodes propose changes as
/// an [`AgentUpdate`] and [`AgentState::apply`] refuses to overwrite anything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    user_id: String,
    session_id: String,
    message_history: Vec<Message>,
    query: String,
    normalized_query: Option<String>,
    selected_device: Option<Device>,
    available_guides: Option<Vec<GuideSummary>>,
    selected_guide: Option<GuideRef>,
    repair_content: Option<RepairContent>,
    fallback_used: bool,
    final_response: Option<String>,
    status_log: Vec<String>,
}

impl AgentState {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        message_history: Vec<Message>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            message_history,
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message_history(&self) -> &[Message] {
        &self.message_history
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn normalized_query(&self) -> Option<&str> {
        self.normalized_query.as_deref()
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.selected_device.as_ref()
    }

    pub fn available_guides(&self) -> Option<&[GuideSummary]> {
        self.available_guides.as_deref()
    }

    pub fn selected_guide(&self) -> Option<&GuideRef> {
        self.selected_guide.as_ref()
    }

    pub fn repair_content(&self) -> Option<&RepairContent> {
        self.repair_content.as_ref()
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn status_log(&self) -> &[String] {
        &self.status_log
    }

    /// A run is over once a non-empty final response exists.
    pub fn is_terminal(&self) -> bool {
        self.final_response
            .as_deref()
            .map(|response| !response.is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn push_status(&mut self, status: impl Into<String>) {
        self.status_log.push(status.into());
    }

    /// Applies `update`, or leaves `self` untouched if any field in it was already set.
    pub fn apply(&mut self, update: AgentUpdate) -> Result<(), GraphError> {
        check_unset("normalized_query", &self.normalized_query, &update.normalized_query)?;
        check_unset("selected_device", &self.selected_device, &update.selected_device)?;
        check_unset("available_guides", &self.available_guides, &update.available_guides)?;
        check_unset("selected_guide", &self.selected_guide, &update.selected_guide)?;
        check_unset("repair_content", &self.repair_content, &update.repair_content)?;
        check_unset("final_response", &self.final_response, &update.final_response)?;

        set_if_some(&mut self.normalized_query, update.normalized_query);
        set_if_some(&mut self.selected_device, update.selected_device);
        set_if_some(&mut self.available_guides, update.available_guides);
        set_if_some(&mut self.selected_guide, update.selected_guide);
        set_if_some(&mut self.repair_content, update.repair_content);
        set_if_some(&mut self.final_response, update.final_response);
        self.fallback_used |= update.fallback_used;
        Ok(())
    }
}

fn check_unset<T>(
    field: &'static str,
    current: &Option<T>,
    update: &Option<T>,
) -> Result<(), GraphError> {
    if current.is_some() && update.is_some() {
        return Err(GraphError::FieldAlreadySet { field });
    }
    Ok(())
}

fn set_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Fields a node wants to set. Unset fields leave the state alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentUpdate {
    pub normalized_query: Option<String>,
    pub selected_device: Option<Device>,
    pub available_guides: Option<Vec<GuideSummary>>,
    pub selected_guide: Option<GuideRef>,
    pub repair_content: Option<RepairContent>,
    pub fallback_used: bool,
    pub final_response: Option<String>,
}

impl AgentUpdate {
    pub fn normalized_query(mut self, value: impl Into<String>) -> Self {
        self.normalized_query = Some(value.into());
        self
    }

    pub fn selected_device(mut self, value: Device) -> Self {
        self.selected_device = Some(value);
        self
    }

    pub fn available_guides(mut self, value: Vec<GuideSummary>) -> Self {
        self.available_guides = Some(value);
        self
    }

    pub fn selected_guide(mut self, value: GuideRef) -> Self {
        self.selected_guide = Some(value);
        self
    }

    pub fn repair_content(mut self, value: RepairContent) -> Self {
        self.repair_content = Some(value);
        self
    }

    pub fn fallback_used(mut self) -> Self {
        self.fallback_used = true;
        self
    }

    pub fn final_response(mut self, value: impl Into<String>) -> Self {
        self.final_response = Some(value.into());
        self
    }
}
