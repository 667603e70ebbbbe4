//! End-to-end tests: generate forms from derived types, lay them out and
//! commit edits through them.

use std::sync::Arc;

use horizon_forms_core::convert::FnCodec;
use horizon_forms_core::{
    AttributeDescriptor, Bindable, CommitOutcome, Decimal, Edit, Element, FormConfig, FormContext,
    FormError, FormGenerator, GridPosition, LayoutStrategy, PlacedElement, WidgetKind, form_value,
};
use horizon_forms_macros::{Bindable, FormEnum};
use parking_lot::{Mutex, RwLock};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_forms_core=trace")
        .with_test_writer()
        .try_init();
}

#[derive(FormEnum, Clone, Debug, PartialEq)]
enum Mode {
    Idle,
    Listening,
    #[form(rename = "Full duplex")]
    FullDuplex,
}

#[derive(Bindable, Default)]
struct ExampleParent {
    #[form(read_only)]
    name: String,

    #[form]
    title: String,
}

#[derive(Bindable, Default)]
#[form(on_change = "touched")]
struct Endpoint {
    #[form]
    port: u16,

    #[form]
    ip: String,

    #[form(multiline)]
    message: String,

    touches: u32,
}

impl Endpoint {
    fn touched(&mut self, _attribute: &AttributeDescriptor) {
        self.touches += 1;
    }
}

#[derive(Bindable)]
#[form(on_change = "record", on_change = "reject_negative")]
struct Example {
    #[form(extends)]
    base: ExampleParent,

    #[form]
    function_name: String,

    #[form]
    number: i32,

    #[form(options("1", "2", "3"))]
    choice: i32,

    #[form(multiline)]
    text_area: String,

    #[form(tooltip = "Operating mode")]
    mode: Mode,

    #[form]
    data: Endpoint,

    #[form(editable = false)]
    locked: bool,

    changes: Vec<String>,
}

impl Example {
    fn record(&mut self, attribute: &AttributeDescriptor) {
        self.changes.push(attribute.name().to_owned());
    }

    fn reject_negative(&mut self, _attribute: &AttributeDescriptor) -> Result<(), String> {
        if self.number < 0 {
            Err(format!("number {} is negative", self.number))
        } else {
            Ok(())
        }
    }
}

impl Default for Example {
    fn default() -> Self {
        Self {
            base: ExampleParent {
                name: "example".into(),
                title: "Receiver".into(),
            },
            function_name: "listen".into(),
            number: 20,
            choice: 2,
            text_area: String::new(),
            mode: Mode::Listening,
            data: Endpoint {
                port: 8080,
                ip: "127.0.0.1".into(),
                message: "hello".into(),
                touches: 0,
            },
            locked: true,
            changes: Vec::new(),
        }
    }
}

#[derive(Bindable)]
struct Point {
    #[form]
    x: i32,

    #[form]
    y: i32,
}

#[derive(Bindable, Default)]
struct Holder {
    #[form]
    before: String,

    #[form]
    endpoint: Option<Endpoint>,

    #[form]
    after: String,
}

fn shared<T>(value: T) -> Arc<RwLock<T>> {
    Arc::new(RwLock::new(value))
}

fn label_text<'a>(element: &PlacedElement<'a>) -> Option<&'a str> {
    element.element.as_label().map(|label| label.text())
}

#[test]
fn test_extraction_order_includes_parent_last() {
    let names: Vec<_> = horizon_forms_core::extract(Example::schema())
        .unwrap()
        .iter()
        .map(|a| a.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "function_name",
            "number",
            "choice",
            "text_area",
            "mode",
            "data",
            "locked",
            "name",
            "title"
        ]
    );
}

#[test]
fn test_paired_positions_and_final_cursor() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let form = generator.generate(shared(Point { x: 1, y: 2 })).unwrap();

    let positions: Vec<_> = form.elements().iter().map(|e| e.position).collect();
    assert_eq!(
        positions,
        vec![
            GridPosition::new(0, 0),
            GridPosition::new(0, 1),
            GridPosition::new(1, 0),
            GridPosition::new(1, 1),
        ]
    );
    assert_eq!(form.cursor(), GridPosition::new(2, 0));

    let labels: Vec<_> = form.elements().iter().filter_map(label_text).collect();
    assert_eq!(labels, vec!["X", "Y"]);
}

#[test]
fn test_stacked_positions() {
    let mut generator = FormGenerator::new(FormContext::new().shared())
        .with_config(FormConfig::new().with_strategy(LayoutStrategy::Stacked));
    let form = generator.generate(shared(Point { x: 1, y: 2 })).unwrap();

    let positions: Vec<_> = form.elements().iter().map(|e| e.position).collect();
    assert_eq!(
        positions,
        vec![
            GridPosition::new(0, 0),
            GridPosition::new(1, 0),
            GridPosition::new(2, 0),
            GridPosition::new(3, 0),
        ]
    );
    assert_eq!(form.cursor(), GridPosition::new(4, 0));
}

#[test]
fn test_nested_section_is_contiguous() {
    init_tracing();
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let form = generator.generate(shared(Example::default())).unwrap();
    let elements = form.elements();

    let header = elements
        .iter()
        .position(|e| label_text(e) == Some("Data:"))
        .unwrap();
    assert_eq!(elements[header].position, GridPosition::new(5, 0));
    assert!(elements[header + 1].element.is_separator());
    assert_eq!(elements[header + 1].position, GridPosition::new(5, 1));

    let child_labels: Vec<_> = elements[header + 2..header + 8]
        .iter()
        .filter_map(label_text)
        .collect();
    assert_eq!(child_labels, vec!["Port", "Ip", "Message"]);
    assert_eq!(elements[header + 2].position, GridPosition::new(6, 0));
    assert_eq!(elements[header + 6].position, GridPosition::new(8, 0));

    let trailing = &elements[header + 8];
    assert!(trailing.element.is_separator());
    assert_eq!(trailing.position, GridPosition::new(9, 0));
    assert_eq!(trailing.column_span, 2);

    assert_eq!(label_text(&elements[header + 9]), Some("Locked"));
    assert_eq!(form.cursor(), GridPosition::new(13, 0));
}

#[test]
fn test_absent_nested_object_yields_header_and_separator() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let form = generator.generate(shared(Holder::default())).unwrap();
    let elements = form.elements();

    let labels: Vec<_> = elements.iter().filter_map(label_text).collect();
    assert_eq!(labels, vec!["Before", "Endpoint:", "After"]);
    assert_eq!(elements.len(), 7);
    assert!(elements[4].element.is_separator());
    assert_eq!(elements[4].position, GridPosition::new(2, 0));
    assert_eq!(form.cursor(), GridPosition::new(4, 0));
}

#[test]
fn test_widget_selection_and_initial_display() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let form = generator.generate(shared(Example::default())).unwrap();

    let number = form.widget(form.widget_for("number").unwrap()).unwrap();
    assert_eq!(number.kind(), WidgetKind::Stepper);
    assert_eq!(number.text(), "20");
    assert_eq!(number.max_width(), 300.0);

    let choice = form.widget(form.widget_for("choice").unwrap()).unwrap();
    assert_eq!(choice.kind(), WidgetKind::ChoiceList);
    assert_eq!(choice.options(), ["1", "2", "3"]);
    assert_eq!(choice.selected_index(), Some(1));

    let mode = form.widget(form.widget_for("mode").unwrap()).unwrap();
    assert_eq!(mode.kind(), WidgetKind::ChoiceList);
    assert_eq!(mode.options(), ["Idle", "Listening", "Full duplex"]);
    assert_eq!(mode.text(), "Listening");
    assert_eq!(mode.tooltip(), Some("Operating mode"));

    let text_area = form.widget(form.widget_for("text_area").unwrap()).unwrap();
    assert_eq!(text_area.kind(), WidgetKind::MultiLineText);

    let message = form.widget(form.widget_at(&["data", "message"]).unwrap()).unwrap();
    assert_eq!(message.kind(), WidgetKind::MultiLineText);
    assert_eq!(message.text(), "hello");
    assert_eq!(message.depth(), 1);

    let locked = form.widget(form.widget_for("locked").unwrap()).unwrap();
    assert!(!locked.is_editable());
    assert!(!locked.is_focusable());
    assert_eq!(locked.text(), "true");

    let name = form.widget(form.widget_for("name").unwrap()).unwrap();
    assert!(!name.is_editable());
}

#[test]
fn test_option_list_precedes_numeric_type() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let choice = form.widget_for("choice").unwrap();
    assert_eq!(form.widget(choice).unwrap().kind(), WidgetKind::ChoiceList);

    let outcome = form.commit(choice, Edit::Select(2)).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(object.read().choice, 3);
    assert_eq!(form.widget(choice).unwrap().selected_index(), Some(2));

    let outcome = form.commit(choice, Edit::SelectText("7".into())).unwrap();
    assert!(matches!(outcome, CommitOutcome::Rejected { .. }));
    assert_eq!(object.read().choice, 3);
}

#[test]
fn test_enum_codec_registration_is_idempotent() {
    let context = FormContext::new().shared();
    let mut generator = FormGenerator::new(context.clone());
    let object = shared(Example::default());

    generator.generate(object.clone()).unwrap();
    let registered = context.converters().len();
    generator.generate(object).unwrap();
    assert_eq!(context.converters().len(), registered);

    let meta = horizon_forms_core::EnumMeta::of::<Mode>();
    assert!(!context.converters().ensure_enum(&meta));
    assert_eq!(
        context.converters().to_text_typed(Some(&Mode::FullDuplex)).unwrap(),
        "Full duplex"
    );
}

#[test]
fn test_invalid_numeric_commit_restores_text() {
    init_tracing();
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let rejected = Arc::new(Mutex::new(Vec::new()));
    let sink = rejected.clone();
    form.commit_rejected.connect(move |edit| sink.lock().push(edit.restored_text.clone()));

    let number = form.widget_for("number").unwrap();
    let outcome = form.commit(number, Edit::Text("twenty".into())).unwrap();

    match outcome {
        CommitOutcome::Rejected {
            error,
            restored_text,
        } => {
            assert_eq!(error.input, "twenty");
            assert_eq!(restored_text, "20");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(object.read().number, 20);
    assert_eq!(form.widget(number).unwrap().text(), "20");
    assert_eq!(*rejected.lock(), vec!["20".to_string()]);
    assert!(object.read().changes.is_empty());
}

#[derive(Bindable)]
struct Gauge {
    #[form]
    level: f64,
}

#[test]
fn test_stepper_keeps_values_within_its_range() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let gauge = shared(Gauge { level: 5.0 });
    let mut form = generator.generate(gauge.clone()).unwrap();
    let level = form.widget_for("level").unwrap();

    let rejected = Arc::new(Mutex::new(Vec::new()));
    let sink = rejected.clone();
    form.commit_rejected.connect(move |edit| sink.lock().push(edit.error.input.clone()));

    let outcome = form.commit(level, Edit::Text("1e12".into())).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(gauge.read().level, f64::from(i32::MAX));

    for text in ["inf", "-inf", "NaN"] {
        let outcome = form.commit(level, Edit::Text(text.into())).unwrap();
        match outcome {
            CommitOutcome::Rejected { restored_text, .. } => {
                assert_eq!(restored_text, "2147483647")
            }
            other => panic!("{text} should be rejected, got {other:?}"),
        }
        assert!(gauge.read().level.is_finite());
    }

    let outcome = form.commit(level, Edit::Value(Box::new(f64::NAN))).unwrap();
    assert!(matches!(outcome, CommitOutcome::Rejected { .. }));
    assert_eq!(gauge.read().level, f64::from(i32::MAX));

    let outcome = form.commit(level, Edit::Value(Box::new(-1e15f64))).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(gauge.read().level, f64::from(i32::MIN));

    assert_eq!(*rejected.lock(), vec!["inf", "-inf", "NaN", "NaN"]);
}

#[test]
fn test_blank_text_rejected_for_required_number() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let number = form.widget_for("number").unwrap();
    let outcome = form.commit(number, Edit::Text("   ".into())).unwrap();
    assert!(matches!(outcome, CommitOutcome::Rejected { .. }));
    assert_eq!(object.read().number, 20);
}

#[test]
fn test_stepper_edits() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let number = form.widget_for("number").unwrap();

    form.commit(number, Edit::Step(3)).unwrap();
    assert_eq!(object.read().number, 23);
    assert_eq!(form.widget(number).unwrap().text(), "23");

    form.commit(number, Edit::Step(-30)).unwrap();
    assert_eq!(object.read().number, -7);

    form.commit(number, Edit::Text("42".into())).unwrap();
    assert_eq!(object.read().number, 42);

    let model = form.widget(number).unwrap().numeric_model().unwrap();
    assert_eq!(model.value(), Decimal::from(42));
    assert!(model.is_integral());
}

#[test]
fn test_enum_selection() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let mode = form.widget_for("mode").unwrap();

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    form.display_changed.connect(move |update| sink.lock().push(update.text.clone()));

    form.commit(mode, Edit::Select(2)).unwrap();
    assert_eq!(object.read().mode, Mode::FullDuplex);
    assert_eq!(form.widget(mode).unwrap().text(), "Full duplex");

    form.commit(mode, Edit::SelectText("Idle".into())).unwrap();
    assert_eq!(object.read().mode, Mode::Idle);
    assert_eq!(*updates.lock(), vec!["Full duplex".to_string(), "Idle".to_string()]);

    let outcome = form.commit(mode, Edit::Select(9)).unwrap();
    assert!(matches!(outcome, CommitOutcome::Rejected { .. }));
    assert_eq!(object.read().mode, Mode::Idle);
}

#[test]
fn test_unsupported_edit_is_structural() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let mut form = generator.generate(shared(Example::default())).unwrap();
    let name = form.widget_for("function_name").unwrap();

    let err = form.commit(name, Edit::Step(1)).unwrap_err();
    assert!(matches!(err, FormError::UnsupportedEdit { .. }));
}

#[test]
fn test_value_edit_converts_through_text() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let number = form.widget_for("number").unwrap();

    form.commit(number, Edit::Value(Box::new(String::from("55")))).unwrap();
    assert_eq!(object.read().number, 55);

    form.commit(number, Edit::Value(Box::new(7u8))).unwrap();
    assert_eq!(object.read().number, 7);
}

#[test]
fn test_read_only_widget_ignores_commits() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let locked = form.widget_for("locked").unwrap();
    let outcome = form.commit(locked, Edit::Text("false".into())).unwrap();
    assert_eq!(outcome, CommitOutcome::Ignored);
    assert!(object.read().locked);
    assert!(object.read().changes.is_empty());
}

#[test]
fn test_handlers_run_on_nested_owner() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let port = form.widget_at(&["data", "port"]).unwrap();
    let outcome = form.commit(port, Edit::Text("9090".into())).unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Applied {
            handler_errors: Vec::new()
        }
    );

    let example = object.read();
    assert_eq!(example.data.port, 9090);
    assert_eq!(example.data.touches, 1);
    assert!(example.changes.is_empty());
}

#[test]
fn test_inherited_attribute_notifies_bound_object() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let title = form.widget_for("title").unwrap();
    form.commit(title, Edit::Text("Sender".into())).unwrap();

    let example = object.read();
    assert_eq!(example.base.title, "Sender");
    assert_eq!(example.changes, vec!["title".to_string()]);
}

#[test]
fn test_handler_cache_capacity_from_config() {
    let config = FormConfig::new().with_handler_cache_capacity(1);
    let context = FormContext::from_config(&config).shared();
    assert_eq!(context.handlers().capacity(), 1);

    let mut generator = FormGenerator::new(context.clone()).with_config(config);
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let name = form.widget_for("function_name").unwrap();
    form.commit(name, Edit::Text("send".into())).unwrap();
    assert!(context.handlers().contains(Example::schema()));

    let port = form.widget_at(&["data", "port"]).unwrap();
    form.commit(port, Edit::Text("9000".into())).unwrap();
    assert_eq!(context.handlers().len(), 1);
    assert!(context.handlers().contains(Endpoint::schema()));
    assert!(!context.handlers().contains(Example::schema()));

    // Evicted handlers are looked up again and still run.
    form.commit(name, Edit::Text("stop".into())).unwrap();
    assert_eq!(object.read().changes, vec!["function_name", "function_name"]);
    assert_eq!(context.handlers().stats().misses, 3);
}

#[test]
fn test_observers_run_before_handlers() {
    let context = FormContext::new().shared();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = context.register_observer(move |attribute: &AttributeDescriptor, owner: &dyn Bindable| {
        let example = owner.as_any().downcast_ref::<Example>().unwrap();
        sink.lock()
            .push((attribute.name().to_owned(), example.changes.len()));
    });

    let mut generator = FormGenerator::new(context.clone());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let name = form.widget_for("function_name").unwrap();

    form.commit(name, Edit::Text("send".into())).unwrap();
    assert_eq!(*seen.lock(), vec![("function_name".to_string(), 0)]);
    assert_eq!(object.read().changes.len(), 1);

    assert!(context.deregister_observer(id));
    form.commit(name, Edit::Text("stop".into())).unwrap();
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn test_handler_failure_does_not_roll_back() {
    init_tracing();
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();
    let number = form.widget_for("number").unwrap();

    let outcome = form.commit(number, Edit::Text("-5".into())).unwrap();
    let CommitOutcome::Applied { handler_errors } = outcome else {
        panic!("expected the edit to apply");
    };
    assert_eq!(handler_errors.len(), 1);
    assert_eq!(handler_errors[0].handler, "reject_negative");
    assert_eq!(handler_errors[0].attribute, "number");

    let example = object.read();
    assert_eq!(example.number, -5);
    assert_eq!(example.changes, vec!["number".to_string()]);
}

#[test]
fn test_refresh_picks_up_programmatic_changes() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let object = shared(Example::default());
    let mut form = generator.generate(object.clone()).unwrap();

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    form.display_changed.connect(move |update| sink.lock().push(update.widget));

    object.write().data.ip = "10.0.0.1".into();
    object.write().choice = 1;
    assert_eq!(form.refresh().unwrap(), 2);
    assert_eq!(form.refresh().unwrap(), 0);

    let ip = form.widget_at(&["data", "ip"]).unwrap();
    assert_eq!(form.widget(ip).unwrap().text(), "10.0.0.1");
    let choice = form.widget_for("choice").unwrap();
    assert_eq!(form.widget(choice).unwrap().selected_index(), Some(0));
    assert_eq!(updates.lock().len(), 2);
}

#[test]
fn test_regenerate_uses_new_settings() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    assert!(matches!(generator.regenerate(), Err(FormError::NoBoundObject)));

    generator.generate(shared(Point { x: 0, y: 0 })).unwrap();
    generator.set_config(FormConfig::new().with_strategy(LayoutStrategy::Stacked));
    let form = generator.regenerate().unwrap();
    assert_eq!(form.cursor(), GridPosition::new(4, 0));
    assert_eq!(form.config().strategy, LayoutStrategy::Stacked);
}

#[test]
fn test_settings_reach_nested_widgets() {
    let config = FormConfig::new().with_max_widget_width(180.0);
    let mut generator = FormGenerator::new(FormContext::new().shared()).with_config(config);
    let form = generator.generate(shared(Example::default())).unwrap();

    assert!(form.widgets().all(|(_, widget)| widget.max_width() == 180.0));
    assert!(form.widgets().any(|(_, widget)| widget.depth() == 1));
}

#[derive(Bindable, Default)]
struct Misconfigured {
    #[form(widget = "slider")]
    level: String,
}

#[test]
fn test_unknown_widget_hint_aborts_generation() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let err = generator.generate(shared(Misconfigured::default())).unwrap_err();
    match err {
        FormError::UnknownFieldKind { attribute, hint } => {
            assert_eq!(attribute, "level");
            assert_eq!(hint, "slider");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(generator.bound_object().is_none());
}

#[derive(Clone, Debug, PartialEq)]
struct Hostname(String);

form_value!(Hostname);

#[derive(Bindable)]
struct Server {
    #[form]
    host: Hostname,
}

#[test]
fn test_custom_value_needs_a_codec() {
    let context = FormContext::new().shared();
    let mut generator = FormGenerator::new(context.clone());
    let object = shared(Server {
        host: Hostname("localhost".into()),
    });

    let err = generator.generate(object.clone()).unwrap_err();
    assert!(matches!(err, FormError::NoConverterRegistered { .. }));

    context.converters().register::<Hostname>(FnCodec::new(
        |host: &Hostname| host.0.clone(),
        |text: &str| Ok(Hostname(text.to_lowercase())),
    ));
    let mut form = generator.generate(object.clone()).unwrap();
    let host = form.widget_for("host").unwrap();
    assert_eq!(form.widget(host).unwrap().kind(), WidgetKind::SingleLineText);
    assert_eq!(form.widget(host).unwrap().text(), "localhost");

    form.commit(host, Edit::Text("Example.ORG".into())).unwrap();
    assert_eq!(object.read().host, Hostname("example.org".into()));
    assert_eq!(form.widget(host).unwrap().text(), "example.org");
}

#[test]
fn test_header_row_pairs_label_with_separator() {
    let mut generator = FormGenerator::new(FormContext::new().shared());
    let form = generator.generate(shared(Example::default())).unwrap();
    let header = form
        .grid()
        .rows()
        .find(|row| {
            row.label()
                .and_then(Element::as_label)
                .is_some_and(|label| label.text() == "Data:")
        })
        .unwrap();
    assert!(header.field().unwrap().is_separator());
}
