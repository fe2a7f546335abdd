use presentation::ProgramTemplate;
use server_api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) template: ProgramTemplate,
}

impl AppState {
    pub(crate) fn new(api: ApiContext, template: ProgramTemplate) -> Self {
        Self { api, template }
    }
}
