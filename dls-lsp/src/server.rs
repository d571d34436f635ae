// LSP front end for the DML analysis core
//
// A thin dispatcher: document events feed analyze/invalidate, queries
// read snapshots. The core is zero-indexed; conversion to the one-indexed
// boundary form happens here and nowhere else.

use dashmap::DashMap;
use dls_core::analysis::symbol::{Symbol, SymbolKind};
use dls_core::diagnostic::{Diagnostic as CoreDiagnostic, Severity};
use dls_core::source::{OneIndexed, Position as CorePosition, ZeroPosition, ZeroSpan};
use dls_core::{CompileConfig, DeviceAnalysis, COMPLETION_KEYWORDS};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{self, *};
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info};

pub struct Backend {
    client: Client,
    analysis: RwLock<Arc<DeviceAnalysis>>,
    documents: DashMap<Url, String>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            analysis: RwLock::new(Arc::new(DeviceAnalysis::new())),
            documents: DashMap::new(),
        }
    }

    fn analysis(&self) -> Arc<DeviceAnalysis> {
        self.analysis
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_analysis(&self, analysis: DeviceAnalysis) {
        *self
            .analysis
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(analysis);
    }

    async fn analyze_and_publish(&self, uri: Url, text: String) {
        let Some(path) = file_path(&uri) else {
            return;
        };
        let diagnostics = self.analysis().analyze(&path, &text);
        let lsp_diagnostics: Vec<Diagnostic> =
            diagnostics.iter().map(to_lsp_diagnostic).collect();
        self.documents.insert(uri.clone(), text);
        self.client
            .publish_diagnostics(uri, lsp_diagnostics, None)
            .await;
    }
}

fn file_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

/// Internal positions are zero-indexed; the protocol surface carries the
/// one-indexed form
fn to_lsp_position(pos: CorePosition<OneIndexed>) -> Position {
    Position::new(pos.line, pos.column)
}

fn to_lsp_range(span: &ZeroSpan) -> Range {
    let one = span.to_one_indexed();
    Range::new(to_lsp_position(one.start()), to_lsp_position(one.end()))
}

fn from_lsp_position(pos: Position) -> ZeroPosition {
    CorePosition::<OneIndexed>::new(pos.line, pos.character).to_zero_indexed()
}

fn to_lsp_diagnostic(diagnostic: &CoreDiagnostic) -> Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    };
    Diagnostic {
        range: to_lsp_range(&diagnostic.span),
        severity: Some(severity),
        code: Some(NumberOrString::String(diagnostic.code().to_string())),
        source: Some("dml-language-server".to_string()),
        message: diagnostic.message.clone(),
        ..Diagnostic::default()
    }
}

fn to_lsp_symbol_kind(kind: SymbolKind) -> lsp_types::SymbolKind {
    use lsp_types::SymbolKind as Lsp;
    match kind {
        SymbolKind::Device => Lsp::CLASS,
        SymbolKind::Bank => Lsp::NAMESPACE,
        SymbolKind::Register => Lsp::PROPERTY,
        SymbolKind::Field => Lsp::FIELD,
        SymbolKind::Method => Lsp::METHOD,
        SymbolKind::Parameter => Lsp::VARIABLE,
        SymbolKind::Attribute => Lsp::PROPERTY,
        SymbolKind::Template => Lsp::INTERFACE,
        SymbolKind::Connect => Lsp::EVENT,
        SymbolKind::Interface => Lsp::INTERFACE,
        SymbolKind::Port => Lsp::EVENT,
        SymbolKind::Implement => Lsp::CONSTRUCTOR,
        SymbolKind::Event => Lsp::EVENT,
        SymbolKind::Group => Lsp::NAMESPACE,
        SymbolKind::Subdevice => Lsp::MODULE,
        SymbolKind::Constant => Lsp::CONSTANT,
        SymbolKind::Typedef => Lsp::TYPE_PARAMETER,
        SymbolKind::Struct => Lsp::STRUCT,
        SymbolKind::Enum => Lsp::ENUM,
        SymbolKind::Variable => Lsp::VARIABLE,
        SymbolKind::LogGroup => Lsp::CONSTANT,
        SymbolKind::Module => Lsp::MODULE,
    }
}

fn to_completion_kind(kind: SymbolKind) -> CompletionItemKind {
    match kind {
        SymbolKind::Method => CompletionItemKind::METHOD,
        SymbolKind::Template | SymbolKind::Interface => CompletionItemKind::INTERFACE,
        SymbolKind::Parameter | SymbolKind::Variable => CompletionItemKind::VARIABLE,
        SymbolKind::Constant | SymbolKind::LogGroup => CompletionItemKind::CONSTANT,
        SymbolKind::Typedef | SymbolKind::Struct | SymbolKind::Enum => {
            CompletionItemKind::STRUCT
        }
        SymbolKind::Module => CompletionItemKind::MODULE,
        _ => CompletionItemKind::CLASS,
    }
}

#[allow(deprecated)]
fn to_document_symbol(symbol: &Symbol) -> DocumentSymbol {
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: symbol.detail.clone(),
        kind: to_lsp_symbol_kind(symbol.kind),
        tags: None,
        deprecated: None,
        range: to_lsp_range(&symbol.span),
        selection_range: to_lsp_range(&symbol.span),
        children: if symbol.children.is_empty() {
            None
        } else {
            Some(symbol.children.iter().map(to_document_symbol).collect())
        },
    }
}

fn location_for(span: &ZeroSpan) -> Option<Location> {
    let file = span.file.as_ref()?;
    let uri = Url::from_file_path(file).ok()?;
    Some(Location::new(uri, to_lsp_range(span)))
}

fn hover_markdown(symbol: &Symbol) -> String {
    let mut text = format!("**{} {}**\n", symbol.kind.as_str(), symbol.name);
    if let Some(detail) = &symbol.detail {
        text.push_str(&format!("\n{}\n", detail));
    }
    if let Some(documentation) = &symbol.documentation {
        text.push_str(&format!("\n{}\n", documentation));
    }
    text
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // compile-commands location can come through initialization
        // options: { "compile_info": "/path/to/dml_compile_commands.json" }
        if let Some(options) = params.initialization_options {
            if let Some(path) = options.get("compile_info").and_then(|v| v.as_str()) {
                match CompileConfig::load(std::path::Path::new(path)) {
                    Ok(config) => {
                        info!("loaded compile info from {}", path);
                        self.set_analysis(DeviceAnalysis::with_config(config));
                    }
                    Err(err) => {
                        self.client
                            .log_message(
                                MessageType::WARNING,
                                format!("ignoring compile info {}: {}", path, err),
                            )
                            .await;
                    }
                }
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions::default()),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "dml-language-server".to_string(),
                version: Some(dls_core::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("DML language server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("didOpen {}", params.text_document.uri);
        self.analyze_and_publish(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // full sync: the last change carries the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.analyze_and_publish(params.text_document.uri, change.text)
            .await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params
            .text
            .or_else(|| self.documents.get(&uri).map(|entry| entry.value().clone()))
            .or_else(|| file_path(&uri).and_then(|path| std::fs::read_to_string(path).ok()));
        if let Some(text) = text {
            self.analyze_and_publish(uri, text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(path) = file_path(&uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position.position);

        let mut items: Vec<CompletionItem> = self
            .analysis()
            .symbols_in_scope(&path, pos)
            .into_iter()
            .map(|symbol| CompletionItem {
                label: symbol.name.clone(),
                kind: Some(to_completion_kind(symbol.kind)),
                detail: symbol.detail.clone(),
                ..CompletionItem::default()
            })
            .collect();
        for keyword in COMPLETION_KEYWORDS {
            items.push(CompletionItem {
                label: (*keyword).to_string(),
                kind: Some(CompletionItemKind::KEYWORD),
                ..CompletionItem::default()
            });
        }
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(path) = file_path(&uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position_params.position);
        let analysis = self.analysis();

        let markdown = match analysis.symbol_at_position(&path, pos) {
            Some(symbol) if symbol.kind == SymbolKind::Template => analysis
                .template_hover(&symbol.name)
                .unwrap_or_else(|| hover_markdown(&symbol)),
            Some(symbol) => hover_markdown(&symbol),
            None => {
                let Some(name) = analysis.name_at_position(&path, pos) else {
                    return Ok(None);
                };
                if let Some(hover) = analysis.template_hover(&name) {
                    hover
                } else {
                    let definitions = analysis.definitions_of(&name);
                    let Some((_, definition)) = definitions.first() else {
                        return Ok(None);
                    };
                    hover_markdown(&definition.symbol)
                }
            }
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: None,
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(path) = file_path(&uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position_params.position);
        let analysis = self.analysis();

        let Some(name) = analysis.name_at_position(&path, pos) else {
            return Ok(None);
        };
        let locations: Vec<Location> = analysis
            .definitions_of(&name)
            .into_iter()
            .filter_map(|(_, definition)| location_for(&definition.symbol.span))
            .collect();
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(path) = file_path(&uri) else {
            return Ok(None);
        };
        let pos = from_lsp_position(params.text_document_position.position);
        let analysis = self.analysis();

        let Some(name) = analysis.name_at_position(&path, pos) else {
            return Ok(None);
        };
        let mut locations = Vec::new();
        if params.context.include_declaration {
            for (_, definition) in analysis.definitions_of(&name) {
                locations.extend(location_for(&definition.symbol.span));
            }
        }
        for reference in analysis.references_of(&name) {
            locations.extend(location_for(&reference.span));
        }
        Ok(Some(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(path) = file_path(&params.text_document.uri) else {
            return Ok(None);
        };
        let symbols: Vec<DocumentSymbol> = self
            .analysis()
            .document_symbols(&path)
            .iter()
            .map(to_document_symbol)
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_conversion_round_trip() {
        // zero-indexed (1, 7) surfaces as (2, 8) and converts back
        let span = ZeroSpan::in_file(
            "/tmp/a.dml",
            dls_core::source::ZeroRange::new(
                CorePosition::new(1, 7),
                CorePosition::new(1, 10),
            ),
        );
        let range = to_lsp_range(&span);
        assert_eq!(range.start, Position::new(2, 8));
        assert_eq!(from_lsp_position(range.start), CorePosition::new(1, 7));
    }

    #[test]
    fn test_diagnostic_conversion_carries_code() {
        let diagnostic = CoreDiagnostic::error(
            dls_core::DiagnosticKind::Import,
            "Cannot resolve import 'x.dml'",
            ZeroSpan::in_file(
                "/tmp/a.dml",
                dls_core::source::ZeroRange::new(
                    CorePosition::new(1, 0),
                    CorePosition::new(1, 20),
                ),
            ),
        );
        let lsp = to_lsp_diagnostic(&diagnostic);
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(
            lsp.code,
            Some(NumberOrString::String("import-error".to_string()))
        );
        assert_eq!(lsp.source.as_deref(), Some("dml-language-server"));
    }

    #[test]
    fn test_document_symbol_nesting() {
        let mut register = Symbol::new(
            "ctrl",
            SymbolKind::Register,
            ZeroSpan::in_file(
                "/tmp/a.dml",
                dls_core::source::ZeroRange::new(
                    CorePosition::new(3, 4),
                    CorePosition::new(5, 4),
                ),
            ),
        );
        register.children.push(Symbol::new(
            "enable",
            SymbolKind::Field,
            ZeroSpan::in_file(
                "/tmp/a.dml",
                dls_core::source::ZeroRange::new(
                    CorePosition::new(4, 8),
                    CorePosition::new(4, 14),
                ),
            ),
        ));
        let document_symbol = to_document_symbol(&register);
        assert_eq!(document_symbol.kind, lsp_types::SymbolKind::PROPERTY);
        let children = document_symbol.children.expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "enable");
    }
}
