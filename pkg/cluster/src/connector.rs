use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use pkg_constants::paths::SERVICE_ACCOUNT_TOKEN;
use serde::Serialize;
use tracing::info;

use crate::{Error, Result};

/// True when the service-account token is mounted, i.e. we run inside a pod.
pub fn is_running_in_cluster() -> bool {
    Path::new(SERVICE_ACCOUNT_TOKEN).exists()
}

/// Kubeconfig contexts available for switching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextList {
    pub current: Option<String>,
    pub contexts: Vec<String>,
}

/// Builds authenticated clients, either from the pod's service account or from a
/// kubeconfig with an optional context override.
#[derive(Debug, Clone)]
pub struct ClusterConnector {
    kubeconfig: Option<PathBuf>,
    in_cluster: bool,
}

impl ClusterConnector {
    pub fn new(kubeconfig: Option<PathBuf>, in_cluster: bool) -> Self {
        Self {
            kubeconfig,
            in_cluster,
        }
    }

    /// Detect in-cluster mode from the environment.
    pub fn detect(kubeconfig: Option<PathBuf>) -> Self {
        Self::new(kubeconfig, is_running_in_cluster())
    }

    pub fn in_cluster(&self) -> bool {
        self.in_cluster
    }

    /// Create a client for `context`, or for the current context when `None`.
    pub async fn connect(&self, context: Option<&str>) -> Result<kube::Client> {
        let config = if self.in_cluster {
            if context.is_some() {
                return Err(Error::InClusterContextSwitch);
            }
            info!("Using in-cluster service account configuration");
            kube::Config::incluster()?
        } else {
            let options = KubeConfigOptions {
                context: context.map(str::to_string),
                ..Default::default()
            };
            kube::Config::from_custom_kubeconfig(self.read_kubeconfig()?, &options).await?
        };

        let client = kube::Client::try_from(config)?;
        Ok(client)
    }

    /// List kubeconfig contexts, sorted by name.
    pub fn contexts(&self) -> Result<ContextList> {
        if self.in_cluster {
            return Err(Error::InClusterContextSwitch);
        }
        let kubeconfig = self.read_kubeconfig()?;
        let mut contexts: Vec<String> = kubeconfig
            .contexts
            .iter()
            .map(|c| c.name.clone())
            .collect();
        contexts.sort();
        Ok(ContextList {
            current: kubeconfig.current_context,
            contexts,
        })
    }

    fn read_kubeconfig(&self) -> Result<Kubeconfig> {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => Kubeconfig::read_from(path)?,
            None => Kubeconfig::read()?,
        };
        Ok(kubeconfig)
    }
}

/// Check connectivity by fetching the API server version.
pub async fn validate(client: &kube::Client) -> Result<String> {
    let info = client.apiserver_version().await?;
    Ok(info.git_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: kind-dev
clusters:
- name: dev
  cluster:
    server: https://127.0.0.1:6443
- name: prod
  cluster:
    server: https://10.0.0.1:6443
contexts:
- name: kind-dev
  context:
    cluster: dev
    user: dev
- name: aks-prod
  context:
    cluster: prod
    user: prod
users:
- name: dev
  user:
    token: dev-token
- name: prod
  user:
    token: prod-token
"#;

    fn write_kubeconfig(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "kube-status-kubeconfig-{}-{}.yaml",
            tag,
            std::process::id()
        ));
        std::fs::write(&path, KUBECONFIG).unwrap();
        path
    }

    #[test]
    fn test_contexts_sorted_with_current() {
        let path = write_kubeconfig("list");
        let connector = ClusterConnector::new(Some(path.clone()), false);
        let list = connector.contexts().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(list.current.as_deref(), Some("kind-dev"));
        assert_eq!(list.contexts, vec!["aks-prod".to_string(), "kind-dev".to_string()]);
    }

    #[test]
    fn test_contexts_refused_in_cluster() {
        let connector = ClusterConnector::new(None, true);
        assert!(matches!(
            connector.contexts(),
            Err(Error::InClusterContextSwitch)
        ));
    }

    #[tokio::test]
    async fn test_connect_with_context_refused_in_cluster() {
        let connector = ClusterConnector::new(None, true);
        assert!(matches!(
            connector.connect(Some("kind-dev")).await,
            Err(Error::InClusterContextSwitch)
        ));
    }

    #[tokio::test]
    async fn test_connect_unknown_context_fails() {
        let path = write_kubeconfig("unknown");
        let connector = ClusterConnector::new(Some(path.clone()), false);
        let result = connector.connect(Some("does-not-exist")).await;
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Kubeconfig(_))));
    }
}
