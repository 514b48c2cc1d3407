//! Content taxonomy and knowledge-graph data models.
//!
//! Pure data shapes used as structured-output targets for the LLM adapter
//! (content classification, graph extraction, memory summaries). Subclass
//! variants serialize to their human-readable descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Node in a knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: i64,
    pub description: String,
    pub category: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub memory_type: String,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub summarized: Option<bool>,
}

/// Edge in a knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    pub source: i64,
    pub target: i64,
    pub description: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub summarized: Option<bool>,
}

fn default_color() -> String {
    "blue".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MemorySummary {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphQlQuery {
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TextSubclass {
    #[serde(rename = "Articles, essays, and reports")]
    Articles,
    #[serde(rename = "Books and manuscripts")]
    Books,
    #[serde(rename = "News stories and blog posts")]
    NewsStories,
    #[serde(rename = "Research papers and academic publications")]
    ResearchPapers,
    #[serde(rename = "Social media posts and comments")]
    SocialMedia,
    #[serde(rename = "Website content and product descriptions")]
    WebsiteContent,
    #[serde(rename = "Personal narratives and stories")]
    PersonalNarratives,
    #[serde(rename = "Spreadsheets and tables")]
    Spreadsheets,
    #[serde(rename = "Forms and surveys")]
    Forms,
    #[serde(rename = "Databases and CSV files")]
    Databases,
    #[serde(rename = "Source code in various programming languages")]
    SourceCode,
    #[serde(rename = "Shell commands and scripts")]
    ShellScripts,
    #[serde(rename = "Markup languages (HTML, XML)")]
    MarkupLanguages,
    #[serde(rename = "Stylesheets (CSS) and configuration files (YAML, JSON, INI)")]
    Stylesheets,
    #[serde(rename = "Chat transcripts and messaging history")]
    ChatTranscripts,
    #[serde(rename = "Customer service logs and interactions")]
    CustomerServiceLogs,
    #[serde(rename = "Conversational AI training data")]
    ConversationalAi,
    #[serde(rename = "Textbook content and lecture notes")]
    TextbookContent,
    #[serde(rename = "Exam questions and academic exercises")]
    ExamQuestions,
    #[serde(rename = "E-learning course materials")]
    ELearningMaterials,
    #[serde(rename = "Poetry and prose")]
    Poetry,
    #[serde(rename = "Scripts for plays, movies, and television")]
    Scripts,
    #[serde(rename = "Song lyrics")]
    SongLyrics,
    #[serde(rename = "Manuals and user guides")]
    Manuals,
    #[serde(rename = "Technical specifications and API documentation")]
    TechSpecs,
    #[serde(rename = "Helpdesk articles and FAQs")]
    HelpdeskArticles,
    #[serde(rename = "Contracts and agreements")]
    LegalContracts,
    #[serde(rename = "Laws, regulations, and legal case documents")]
    Laws,
    #[serde(rename = "Policy documents and compliance materials")]
    PolicyDocuments,
    #[serde(rename = "Clinical trial reports")]
    ClinicalTrials,
    #[serde(rename = "Patient records and case notes")]
    PatientRecords,
    #[serde(rename = "Scientific journal articles")]
    ScientificArticles,
    #[serde(rename = "Financial reports and statements")]
    FinancialReports,
    #[serde(rename = "Business plans and proposals")]
    BusinessPlans,
    #[serde(rename = "Market research and analysis reports")]
    MarketResearch,
    #[serde(rename = "Ad copies and marketing slogans")]
    AdCopies,
    #[serde(rename = "Product catalogs and brochures")]
    ProductCatalogs,
    #[serde(rename = "Press releases and promotional content")]
    PressReleases,
    #[serde(rename = "Professional and formal correspondence")]
    ProfessionalEmails,
    #[serde(rename = "Personal emails and letters")]
    PersonalEmails,
    #[serde(rename = "Image and video captions")]
    ImageCaptions,
    #[serde(rename = "Annotations and metadata for various media")]
    Annotations,
    #[serde(rename = "Vocabulary lists and grammar rules")]
    VocabLists,
    #[serde(rename = "Language exercises and quizzes")]
    LanguageExercises,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AudioSubclass {
    #[serde(rename = "Music tracks and albums")]
    MusicTracks,
    #[serde(rename = "Podcasts and radio broadcasts")]
    Podcasts,
    #[serde(rename = "Audiobooks and audio guides")]
    Audiobooks,
    #[serde(rename = "Recorded interviews and speeches")]
    Interviews,
    #[serde(rename = "Sound effects and ambient sounds")]
    SoundEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ImageSubclass {
    #[serde(rename = "Photographs and digital images")]
    Photographs,
    #[serde(rename = "Illustrations, diagrams, and charts")]
    Illustrations,
    #[serde(rename = "Infographics and visual data representations")]
    Infographics,
    #[serde(rename = "Artwork and paintings")]
    Artwork,
    #[serde(rename = "Screenshots and graphical user interfaces")]
    Screenshots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VideoSubclass {
    #[serde(rename = "Movies and short films")]
    Movies,
    #[serde(rename = "Documentaries and educational videos")]
    Documentaries,
    #[serde(rename = "Video tutorials and how-to guides")]
    Tutorials,
    #[serde(rename = "Animated features and cartoons")]
    AnimatedFeatures,
    #[serde(rename = "Live event recordings and sports broadcasts")]
    LiveEvents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MultimediaSubclass {
    #[serde(rename = "Interactive web content and games")]
    WebContent,
    #[serde(rename = "Virtual reality (VR) and augmented reality (AR) experiences")]
    VrExperiences,
    #[serde(rename = "Mixed media presentations and slide decks")]
    MixedMedia,
    #[serde(rename = "E-learning modules with integrated multimedia")]
    ELearningModules,
    #[serde(rename = "Digital exhibitions and virtual tours")]
    DigitalExhibitions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Model3dSubclass {
    #[serde(rename = "Architectural renderings and building plans")]
    ArchitecturalRenderings,
    #[serde(rename = "Product design models and prototypes")]
    ProductModels,
    #[serde(rename = "3D animations and character models")]
    Animations,
    #[serde(rename = "Scientific simulations and visualizations")]
    ScientificVisualizations,
    #[serde(rename = "Virtual objects for AR/VR applications")]
    VrObjects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ProceduralSubclass {
    #[serde(rename = "Tutorials and step-by-step guides")]
    TutorialsGuides,
    #[serde(rename = "Workflow and process descriptions")]
    WorkflowDescriptions,
    #[serde(rename = "Simulation and training exercises")]
    Simulations,
    #[serde(rename = "Recipes and crafting instructions")]
    Recipes,
}
/// A content type label together with its matching subclasses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "subclass")]
pub enum ContentLabel {
    #[serde(rename = "TEXT")]
    Text(Vec<TextSubclass>),
    #[serde(rename = "AUDIO")]
    Audio(Vec<AudioSubclass>),
    #[serde(rename = "IMAGE")]
    Image(Vec<ImageSubclass>),
    #[serde(rename = "VIDEO")]
    Video(Vec<VideoSubclass>),
    #[serde(rename = "MULTIMEDIA")]
    Multimedia(Vec<MultimediaSubclass>),
    #[serde(rename = "3D_MODEL")]
    Model3d(Vec<Model3dSubclass>),
    #[serde(rename = "PROCEDURAL")]
    Procedural(Vec<ProceduralSubclass>),
}

/// A single class label prediction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContentPrediction {
    pub label: ContentLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CognitiveLayerSubgroup {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CognitiveLayer {
    pub category_name: String,
    #[serde(default)]
    pub cognitive_layers: Vec<CognitiveLayerSubgroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults_color() {
        let json = r#"{"id": 1, "description": "Jack London", "category": "person", "memory_type": "semantic"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.color, "blue");
        assert!(node.created_at.is_none());
    }

    #[test]
    fn test_knowledge_graph_empty_object() {
        let graph: KnowledgeGraph = serde_json::from_str("{}").unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_subclass_serializes_to_description() {
        let json = serde_json::to_string(&TextSubclass::Books).unwrap();
        assert_eq!(json, "\"Books and manuscripts\"");
    }

    #[test]
    fn test_content_prediction_shape() {
        let json = r#"{"label": {"type": "TEXT", "subclass": ["Books and manuscripts", "Poetry and prose"]}}"#;
        let prediction: ContentPrediction = serde_json::from_str(json).unwrap();
        assert_eq!(
            prediction.label,
            ContentLabel::Text(vec![TextSubclass::Books, TextSubclass::Poetry])
        );
    }

    #[test]
    fn test_three_d_label_tag() {
        let label = ContentLabel::Model3d(vec![Model3dSubclass::ProductModels]);
        let json = serde_json::to_value(&label).unwrap();
        assert_eq!(json["type"], "3D_MODEL");
    }
}
