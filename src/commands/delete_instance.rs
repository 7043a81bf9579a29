// ABOUTME: delete-instance command implementation.
// ABOUTME: Wires config, adapters and flags into one replacement run and reports the outcome.

use nodeswap::clock::{CancelToken, TokioClock};
use nodeswap::config::{Config, ReplacementConfig};
use nodeswap::error::Result;
use nodeswap::inventory::collect_inventory;
use nodeswap::output::Output;
use nodeswap::provider::traits::ClusterApi;
use nodeswap::provider::{CommandCloud, Kubectl};
use nodeswap::replace::{
    Approved, ClusterSide, Collaborators, FailurePolicy, GateDecision, ReplacementRequest, approve,
    execute,
};

use crate::cli::DeleteInstanceArgs;

/// Delete (and, with surge, replace) one instance.
pub async fn delete_instance(
    config: Config,
    args: DeleteInstanceArgs,
    mut output: Output,
    cancel: CancelToken,
) -> Result<()> {
    output.start_timer();

    let cloud = CommandCloud::new(&config.cluster, &config.cloud)?;
    // No kubectl in cloud-only mode: the cluster may be unreachable.
    let kubectl = (!args.cloudonly).then(|| Kubectl::new(config.kube_context(), &config.kubernetes));

    output.progress(&format!("Listing instances of cluster {}", config.cluster));
    let inventory = collect_inventory(
        &cloud,
        kubectl.as_ref().map(|k| k as &dyn ClusterApi),
    )
    .await?;

    let request = build_request(&args, &config.replacement);
    let collaborators = Collaborators {
        cloud: &cloud,
        cluster: kubectl.as_ref().map(|k| ClusterSide {
            api: k,
            validator: k,
        }),
        clock: &TokioClock,
    };

    let target = match approve(&inventory, &request)? {
        GateDecision::Proceed(target) => target,
        GateDecision::ConfirmationRequired(target) => {
            output.notice(&format!(
                "Instance {} would be deleted; run again with --yes to delete it",
                describe(&target)
            ));
            return Ok(());
        }
    };
    output.notice(&format!("Instance {} found for deletion", describe(&target)));

    let replaced = execute(target, request, collaborators, &cancel).await?;
    for warning in &replaced.warnings {
        output.warning(&warning.message);
    }
    let how = if replaced.surged {
        "replacement already launching"
    } else {
        "group will launch a replacement"
    };
    output.success(&format!("Deleted instance {} ({how})", replaced.instance));

    Ok(())
}

fn describe(target: &Approved) -> String {
    match target.instance.node_name() {
        Some(node) => format!("{} ({node})", target.instance.id),
        None => target.instance.id.to_string(),
    }
}

/// Layer command-line flags over the configured replacement defaults.
fn build_request(args: &DeleteInstanceArgs, defaults: &ReplacementConfig) -> ReplacementRequest {
    let mut builder = ReplacementRequest::builder(args.instance.as_str())
        .defaults(defaults)
        .cloud_only(args.cloudonly)
        .confirmed(args.yes);

    if let Some(surge) = args.surge {
        builder = builder.surge(surge);
    }
    if let Some(fail) = args.fail_on_drain_error {
        builder = builder.drain_policy(FailurePolicy::from_fail_flag(fail));
    }
    if let Some(fail) = args.fail_on_validate_error {
        builder = builder.validation_policy(FailurePolicy::from_fail_flag(fail));
    }
    if let Some(delay) = args.post_drain_delay {
        builder = builder.post_drain_delay(delay);
    }
    if let Some(timeout) = args.validation_timeout {
        builder = builder.validation_timeout(timeout);
    }
    if let Some(count) = args.validate_count {
        builder = builder.validate_count(count);
    }

    builder.build()
}
