//! Horizon Forms Network Settings Example
//!
//! Generates a form for a small settings object and drives it from the
//! console:
//! - Widget selection (steppers, choice lists, text fields, sub-forms)
//! - Edits that apply, edits that are rejected, and change handlers
//!
//! Run with: cargo run -p horizon-forms --example network_settings
//! Set `RUST_LOG=horizon_forms_core=trace` to watch the commit pipeline.

use horizon_forms::prelude::*;
use horizon_forms::{FormDebug, FormFormatOptions, LayoutStrategy};
use tracing_subscriber::EnvFilter;

#[derive(FormEnum, Clone, Debug, PartialEq)]
#[form(crate = "horizon_forms")]
enum Transport {
    Tcp,
    Udp,
    #[form(rename = "TLS over TCP")]
    Tls,
}

#[derive(Bindable)]
#[form(crate = "horizon_forms")]
struct Node {
    #[form(read_only, tooltip = "Assigned by the cluster")]
    node_id: String,
}

#[derive(Bindable)]
#[form(crate = "horizon_forms", on_change = "rebuild_url")]
struct Endpoint {
    #[form]
    host: String,

    #[form(tooltip = "TCP or UDP port")]
    port: u16,

    #[form]
    transport: Transport,

    url: String,
}

impl Endpoint {
    fn rebuild_url(&mut self, _attribute: &AttributeDescriptor) {
        let scheme = match self.transport {
            Transport::Tls => "tls",
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
        };
        self.url = format!("{scheme}://{}:{}", self.host, self.port);
    }
}

#[derive(Bindable)]
#[form(crate = "horizon_forms", on_change = "validate")]
struct NetworkSettings {
    #[form(extends)]
    node: Node,

    #[form]
    display_name: String,

    #[form(options("1", "2", "4", "8"))]
    worker_threads: u8,

    #[form]
    timeout_secs: f64,

    #[form]
    endpoint: Endpoint,

    #[form(multiline)]
    notes: String,
}

impl NetworkSettings {
    fn validate(&mut self, attribute: &AttributeDescriptor) -> Result<(), String> {
        if attribute.name() == "timeout_secs" && self.timeout_secs <= 0.0 {
            return Err(format!("timeout must be positive, got {}", self.timeout_secs));
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = bind(NetworkSettings {
        node: Node {
            node_id: "node-7".into(),
        },
        display_name: "Edge relay".into(),
        worker_threads: 4,
        timeout_secs: 2.5,
        endpoint: Endpoint {
            host: "10.0.0.2".into(),
            port: 7400,
            transport: Transport::Tcp,
            url: String::new(),
        },
        notes: String::new(),
    });

    let context = FormContext::new().shared();
    context.register_observer(|attribute: &AttributeDescriptor, _owner: &dyn Bindable| {
        tracing::info!(attribute = attribute.name(), "attribute changed");
    });

    let mut generator = FormGenerator::new(context);
    let mut form = generator.generate(settings.clone())?;
    form.display_changed.connect(|update| {
        tracing::debug!(text = %update.text, "display changed");
    });
    form.commit_rejected.connect(|rejected| {
        tracing::warn!(error = %rejected.error, restored = %rejected.restored_text, "edit rejected");
    });

    println!("{}", FormDebug::with_options(FormFormatOptions::detailed()).format(&form));

    let edits = [
        (vec!["endpoint", "port"], Edit::Step(10)),
        (vec!["endpoint", "transport"], Edit::SelectText("TLS over TCP".into())),
        (vec!["endpoint", "host"], Edit::Text("relay.example.net".into())),
        (vec!["worker_threads"], Edit::Select(3)),
        (vec!["timeout_secs"], Edit::Text("soon".into())),
        (vec!["timeout_secs"], Edit::Text("-1".into())),
        (vec!["node_id"], Edit::Text("node-8".into())),
    ];
    for (path, edit) in edits {
        let Some(id) = form.widget_at(&path) else {
            println!("no widget at {path:?}");
            continue;
        };
        let outcome = form.commit(id, edit)?;
        println!("{:<28} -> {outcome:?}", path.join("."));
    }

    {
        let settings = settings.read();
        println!();
        println!("url:            {}", settings.endpoint.url);
        println!("worker threads: {}", settings.worker_threads);
        println!("timeout:        {}", settings.timeout_secs);
    }

    generator.set_config(FormConfig::new().with_strategy(LayoutStrategy::Stacked));
    let stacked = generator.regenerate()?;
    println!();
    println!("{}", FormDebug::with_options(FormFormatOptions::minimal()).format(&stacked));

    Ok(())
}
