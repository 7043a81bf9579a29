// ABOUTME: Test support utilities.
// ABOUTME: Recording fake collaborators and a standard inventory fixture.

use async_trait::async_trait;
use nodeswap::clock::CancelHandle;
use nodeswap::inventory::{CloudInstance, CloudInstanceGroup, ClusterMember, GroupRole, Inventory};
use nodeswap::provider::traits::{
    CloudError, CloudProvider, ClusterApi, ClusterApiError, ClusterValidator, ValidationFailure,
    ValidationReport, ValidatorError,
};
use nodeswap::types::{GroupName, NodeName};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("nodeswap=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A collaborator call, in the order it was made.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListGroups,
    Detach(String),
    Terminate(String),
    ListNodes,
    Cordon(String),
    Drain(String),
    Validate,
}

#[allow(dead_code)]
impl Call {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Call::Detach(_) | Call::Terminate(_) | Call::Cordon(_) | Call::Drain(_)
        )
    }
}

/// Shared, ordered record of calls across every fake.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

#[allow(dead_code)]
impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }
}

// =============================================================================
// Cloud
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeCloud {
    pub log: CallLog,
    pub groups: Vec<CloudInstanceGroup>,
    pub fail_detach: bool,
    pub fail_terminate: bool,
}

#[async_trait]
impl CloudProvider for FakeCloud {
    async fn list_groups(
        &self,
        members: &[ClusterMember],
    ) -> Result<Vec<CloudInstanceGroup>, CloudError> {
        self.log.push(Call::ListGroups);
        // Drop correlations for nodes the cluster did not report.
        let mut groups = self.groups.clone();
        for instance in groups
            .iter_mut()
            .flat_map(|g| g.ready.iter_mut().chain(g.needs_update.iter_mut()))
        {
            let known = instance
                .member
                .as_ref()
                .is_some_and(|m| members.iter().any(|live| live.name == m.name));
            if !known {
                instance.member = None;
            }
        }
        Ok(groups)
    }

    async fn detach_instance(&self, instance: &CloudInstance) -> Result<(), CloudError> {
        self.log.push(Call::Detach(instance.id.to_string()));
        if self.fail_detach {
            return Err(CloudError::Api("detach refused".to_string()));
        }
        Ok(())
    }

    async fn terminate_instance(&self, instance: &CloudInstance) -> Result<(), CloudError> {
        self.log.push(Call::Terminate(instance.id.to_string()));
        if self.fail_terminate {
            return Err(CloudError::Api("terminate refused".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Cluster
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeCluster {
    pub log: CallLog,
    pub nodes: Vec<ClusterMember>,
    pub unreachable: bool,
    pub fail_cordon: bool,
    pub fail_drain: bool,
    /// Tripped once a drain has been issued, as if the operator hit Ctrl-C.
    pub cancel_on_drain: Option<CancelHandle>,
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_nodes(&self) -> Result<Vec<ClusterMember>, ClusterApiError> {
        self.log.push(Call::ListNodes);
        if self.unreachable {
            return Err(ClusterApiError::Unreachable("connection refused".to_string()));
        }
        Ok(self.nodes.clone())
    }

    async fn cordon_node(&self, node: &NodeName) -> Result<(), ClusterApiError> {
        self.log.push(Call::Cordon(node.to_string()));
        if self.fail_cordon {
            return Err(ClusterApiError::Api("cordon refused".to_string()));
        }
        Ok(())
    }

    async fn drain_node(&self, node: &NodeName) -> Result<(), ClusterApiError> {
        self.log.push(Call::Drain(node.to_string()));
        if let Some(handle) = &self.cancel_on_drain {
            handle.cancel();
        }
        if self.fail_drain {
            return Err(ClusterApiError::Eviction(
                "cannot evict pod as it would violate the pod's disruption budget".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Validator
// =============================================================================

/// One scripted validator answer.
#[derive(Debug, Clone)]
pub enum Verdict {
    Healthy,
    Unhealthy(Option<&'static str>),
    Error,
}

/// Plays back verdicts in order, repeating the last one forever.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    pub log: CallLog,
    script: Mutex<VecDeque<Verdict>>,
    last: Mutex<Option<Verdict>>,
}

#[allow(dead_code)]
impl ScriptedValidator {
    pub fn new(log: CallLog, script: impl IntoIterator<Item = Verdict>) -> Self {
        Self {
            log,
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
        }
    }

    /// Always healthy.
    pub fn healthy(log: CallLog) -> Self {
        Self::new(log, [Verdict::Healthy])
    }

    fn next(&self) -> Verdict {
        let mut last = self.last.lock();
        if let Some(v) = self.script.lock().pop_front() {
            *last = Some(v);
        }
        last.clone().unwrap_or(Verdict::Healthy)
    }
}

#[async_trait]
impl ClusterValidator for ScriptedValidator {
    async fn validate(&self) -> Result<ValidationReport, ValidatorError> {
        self.log.push(Call::Validate);
        match self.next() {
            Verdict::Healthy => Ok(ValidationReport::healthy()),
            Verdict::Unhealthy(group) => Ok(ValidationReport::failing(ValidationFailure {
                kind: "Node".to_string(),
                name: "ip-10-0-9-9".to_string(),
                message: "node is not ready".to_string(),
                group: group.map(|g| GroupName::new(g).unwrap()),
            })),
            Verdict::Error => Err(ValidatorError::Unavailable("api timeout".to_string())),
        }
    }
}

// =============================================================================
// Fixture
// =============================================================================

#[allow(dead_code)]
fn group(name: &str, role: GroupRole) -> CloudInstanceGroup {
    CloudInstanceGroup::new(GroupName::new(name).unwrap(), role)
}

/// Two groups; every instance but `i-orphan` has joined the cluster.
///
/// ```text
/// control-plane-a  ready: i-cp (cp-1)
/// nodes            ready: i-1 (ip-10-0-0-1), i-2 (ip-10-0-0-2), i-orphan
///                  needs_update: i-3 (ip-10-0-0-3)
/// ```
#[allow(dead_code)]
pub fn fixture_groups() -> Vec<CloudInstanceGroup> {
    let mut cp = group("control-plane-a", GroupRole::ControlPlane);
    cp.ready = vec![CloudInstance::new("i-cp").with_member("cp-1", true)];

    let mut nodes = group("nodes", GroupRole::Node);
    nodes.ready = vec![
        CloudInstance::new("i-1").with_member("ip-10-0-0-1", true),
        CloudInstance::new("i-2").with_member("ip-10-0-0-2", true),
        CloudInstance::new("i-orphan"),
    ];
    nodes.needs_update = vec![CloudInstance::new("i-3").with_member("ip-10-0-0-3", true)];

    vec![cp, nodes]
}

#[allow(dead_code)]
pub fn fixture() -> Inventory {
    Inventory::new(fixture_groups()).unwrap()
}

/// Cluster members matching [`fixture_groups`].
#[allow(dead_code)]
pub fn fixture_members() -> Vec<ClusterMember> {
    fixture_groups()
        .iter()
        .flat_map(|g| g.instances())
        .filter_map(|i| i.member.clone())
        .collect()
}
