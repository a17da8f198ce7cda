use crate::admission::AdmissionPipeline;

pub(crate) struct ApiServerState {
    pub(crate) pipeline: AdmissionPipeline,
    /// Reviews bigger than this amount of bytes are rejected
    pub(crate) max_body_size: usize,
}
