/// A ready address resolved from the endpoint slices of a Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub address: String,
    /// Name of the pod behind the address, if the slice references one.
    pub pod_name: Option<String>,
    /// Hostname published on the endpoint, used when there is no pod reference.
    pub hostname: Option<String>,
}

impl ResolvedEndpoint {
    /// Name shown for the workload behind this address.
    pub fn workload_name(&self) -> String {
        self.pod_name
            .clone()
            .or_else(|| self.hostname.clone())
            .unwrap_or_default()
    }
}
