use shadelink_ast::syntax::{
    Expression, ExternalDeclaration, FullType, Prototype, Statement, TranslationUnit,
};
use shadelink_ast::{BinaryOp, Document, Printer, StorageQualifier};
use shadelink_core::{PatchStage, ShadelinkConfig, ShadelinkError};
use shadelink_transform::{transform_pipeline, DiagnosticClass, Pipeline};

fn interface(storage: StorageQualifier, ty: &str, names: &[&str]) -> ExternalDeclaration {
    ExternalDeclaration::variable(FullType::new(ty).with_storage(storage), names)
}

fn document(declarations: Vec<ExternalDeclaration>) -> Document {
    let unit = declarations
        .into_iter()
        .fold(TranslationUnit::new().with(ExternalDeclaration::directive("#version 150")), TranslationUnit::with);
    Document::from_syntax(&unit).expect("test program should lower")
}

fn vec_of(ty: &str, value: f64) -> Expression {
    Expression::call(ty, vec![Expression::float(value)])
}

/// A fragment program that reads every name in `inputs` into `fragColor`.
fn fragment(inputs: Vec<ExternalDeclaration>, reads: &[&str]) -> Document {
    let mut declarations = inputs;
    declarations.push(interface(StorageQualifier::Out, "vec4", &["fragColor"]));
    let body = reads
        .iter()
        .map(|name| Statement::assign("fragColor", Expression::reference(*name)))
        .collect();
    declarations.push(ExternalDeclaration::function("main", body));
    document(declarations)
}

fn print(pipeline: &Pipeline, stage: PatchStage) -> String {
    Printer::print(pipeline.get(stage).expect("stage should be present"))
}

#[test]
fn test_missing_output_is_declared_and_rerun_changes_nothing() {
    let vertex = document(vec![
        interface(StorageQualifier::Out, "vec2", &["uv"]),
        ExternalDeclaration::function("main", vec![Statement::assign("uv", vec_of("vec2", 0.5))]),
    ]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "vec3", &["normal"])], &["normal"]),
        );

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert_eq!(report.reconciled.declared.len(), 1);
    assert_eq!(report.reconciled.declared[0].name, "normal");
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::MissingOutPatched),
        1
    );

    let patched = print(&pipeline, PatchStage::Vertex);
    assert!(patched.starts_with("#version 150\nout vec3 normal;\n"));
    assert!(patched.contains("    uv = vec2(0.5);\n    normal = vec3(0.0);\n}\n"));

    let again = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert!(again.reconciled.is_empty());
    assert!(!again.diagnostics.has_warnings());
    assert_eq!(print(&pipeline, PatchStage::Vertex), patched);
}

#[test]
fn test_dimension_mismatch_is_reported_and_left_alone() {
    let vertex = document(vec![
        interface(StorageQualifier::Out, "float", &["fog"]),
        ExternalDeclaration::function("main", vec![Statement::assign("fog", Expression::float(1.0))]),
    ]);
    let original = Printer::print(&vertex);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "vec3", &["fog"])], &["fog"]),
        );

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert_eq!(report.reconciled.unpatchable.len(), 1);
    assert!(report.reconciled.is_empty());
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::DimensionMismatch),
        1
    );
    assert_eq!(print(&pipeline, PatchStage::Vertex), original);
}

#[test]
fn test_type_mismatch_converts_through_alias() {
    let vertex = document(vec![
        interface(StorageQualifier::Out, "vec3", &["color"]),
        ExternalDeclaration::function(
            "main",
            vec![
                Statement::assign("color", vec_of("vec3", 1.0)),
                Statement::assign(
                    "color",
                    Expression::binary(BinaryOp::Mul, Expression::reference("color"), Expression::float(0.5)),
                ),
            ],
        ),
    ]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "vec4", &["color"])], &["color"]),
        );

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert_eq!(report.reconciled.aliased.len(), 1);
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::TypeMismatchPatched),
        1
    );

    let doc = pipeline.get(PatchStage::Vertex).unwrap();
    // The external declaration and the final conversion.
    assert_eq!(doc.occurrences("color"), 2);
    // The internal declaration, three uses in main and the conversion.
    assert_eq!(doc.occurrences("shadelink_alias_color"), 5);
    assert!(doc.index_is_consistent());

    let text = Printer::print(doc);
    assert!(text.contains("out vec4 color;\n"));
    assert!(text.contains("vec3 shadelink_alias_color;\n"));
    assert!(text.contains("    shadelink_alias_color = shadelink_alias_color * 0.5;\n"));
    assert!(text.ends_with("    color = vec4(shadelink_alias_color, vec4(0));\n}\n"));
}

#[test]
fn test_vector_narrowing_converts_without_padding() {
    let vertex = document(vec![
        interface(StorageQualifier::Out, "vec4", &["color"]),
        ExternalDeclaration::function("main", vec![Statement::assign("color", vec_of("vec4", 1.0))]),
    ]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "vec3", &["color"])], &["color"]),
        );

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert_eq!(report.reconciled.aliased.len(), 1);
    assert!(report.reconciled.unpatchable.is_empty());
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::DimensionMismatch),
        0
    );

    let text = print(&pipeline, PatchStage::Vertex);
    assert!(text.contains("out vec3 color;\n"));
    assert!(text.contains("vec4 shadelink_alias_color;\n"));
    assert!(text.contains("    shadelink_alias_color = vec4(1.0);\n"));
    assert!(text.ends_with("    color = vec3(shadelink_alias_color);\n}\n"));
    assert!(!text.contains("vec4(0)"));
}

#[test]
fn test_unused_input_is_ignored() {
    let vertex = document(vec![ExternalDeclaration::function("main", vec![])]);
    let original = Printer::print(&vertex);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "vec2", &["lightmapUv"])], &[]),
        );

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert!(report.reconciled.is_empty());
    assert!(!report.diagnostics.has_warnings());
    assert_eq!(print(&pipeline, PatchStage::Vertex), original);
}

#[test]
fn test_normalization_runs_on_every_stage() {
    let helper = ExternalDeclaration::Function {
        prototype: Prototype::new(FullType::new("float"), "luma")
            .with_parameter(FullType::new("vec3").with_storage(StorageQualifier::Const), "rgb"),
        body: vec![Statement::Return {
            value: Some(Expression::reference("rgb")),
        }],
    };
    let vertex = document(vec![
        helper.clone(),
        ExternalDeclaration::Empty,
        ExternalDeclaration::function("main", vec![]),
    ]);
    let fragment = document(vec![helper, ExternalDeclaration::function("main", vec![])]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(PatchStage::Fragment, fragment);

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    let vertex = &report.normalized[&PatchStage::Vertex];
    assert_eq!(vertex.removed_functions, vec!["luma".to_string()]);
    assert_eq!(vertex.removed_empty_declarations, 1);
    assert_eq!(
        report.normalized[&PatchStage::Fragment].removed_functions,
        vec!["luma".to_string()]
    );
    // One reported, the second merged into the closing summary.
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::UnusedFunction),
        1
    );
    assert_eq!(
        print(&pipeline, PatchStage::Fragment),
        "#version 150\n\nvoid main() {\n}\n"
    );
}

#[test]
fn test_prefix_collision_stops_reconciliation() {
    let vertex = document(vec![ExternalDeclaration::function(
        "main",
        vec![Statement::declare(FullType::new("float"), "tmp_scale", Expression::float(2.0))],
    )]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "float", &["depth"])], &["depth"]),
        );
    let config = ShadelinkConfig {
        alias_prefix: "tmp_".to_string(),
        ..ShadelinkConfig::default()
    };

    let report = transform_pipeline(&mut pipeline, &config).unwrap();
    assert!(report.reconciled.aborted);
    assert!(report.reconciled.is_empty());
    assert_eq!(
        report.diagnostics.warnings(DiagnosticClass::PrefixCollision),
        1
    );
    assert_eq!(pipeline.get(PatchStage::Vertex).unwrap().occurrences("depth"), 0);
}

#[test]
fn test_missing_entry_point_is_fatal() {
    let vertex = document(vec![ExternalDeclaration::function("main", vec![])]);
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(
            PatchStage::Fragment,
            fragment(vec![interface(StorageQualifier::In, "int", &["layer"])], &["layer"]),
        );
    let mut config = ShadelinkConfig {
        entry_point: "vertexMain".to_string(),
        ..ShadelinkConfig::default()
    };
    config.normalize.remove_unused_functions = false;

    let report = transform_pipeline(&mut pipeline, &config);
    assert!(matches!(report, Err(ShadelinkError::MissingEntryPoint(name)) if name == "vertexMain"));
}

#[test]
fn test_interchange_json_drives_the_pipeline() {
    let vertex: TranslationUnit = serde_json::from_value(serde_json::json!({
        "declarations": [
            { "kind": "directive", "text": "#version 330 core" },
            {
                "kind": "variable",
                "ty": { "qualifiers": [{ "other": "flat" }, { "storage": "out" }], "specifier": "ivec2" },
                "members": [{ "name": "cell" }]
            },
            {
                "kind": "function",
                "prototype": { "return_type": { "specifier": "void" }, "name": "main" },
                "body": [{
                    "kind": "expression",
                    "expression": {
                        "kind": "assign",
                        "op": "assign",
                        "target": { "kind": "reference", "name": "cell" },
                        "value": {
                            "kind": "call",
                            "callee": "ivec2",
                            "arguments": [{ "kind": "literal", "value": { "int": 4 } }]
                        }
                    }
                }]
            }
        ]
    }))
    .unwrap();
    let vertex = Document::from_syntax(&vertex).unwrap();
    let consumer = fragment(
        vec![ExternalDeclaration::variable(
            FullType::new("vec2")
                .with_qualifier("flat")
                .with_storage(StorageQualifier::In),
            &["cell"],
        )],
        &["cell"],
    );
    let mut pipeline = Pipeline::new()
        .with(PatchStage::Vertex, vertex)
        .with(PatchStage::Fragment, consumer);

    let report = transform_pipeline(&mut pipeline, &ShadelinkConfig::default()).unwrap();
    assert_eq!(report.reconciled.aliased.len(), 1);
    let text = print(&pipeline, PatchStage::Vertex);
    assert!(text.contains("flat out vec2 cell;\n"));
    assert!(text.contains("ivec2 shadelink_alias_cell;\n"));
    assert!(text.contains("    cell = vec2(shadelink_alias_cell);\n"));
}
