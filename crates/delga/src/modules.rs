//! Engine content-module registry.
//!
//! The manifest cross-references resource file extensions against the
//! content modules the engine loads them with, and modules can declare
//! their format as incompressible (already-compressed containers are
//! stored instead of deflated).

/// Content module categories eligible for `requireFormat` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Animation,
    Archive,
    Font,
    Image,
    LanguagePack,
    Model,
    OcclusionMesh,
    Rig,
    Skin,
    Sound,
    Video,
}

impl ModuleKind {
    /// Order in which kinds are consulted when matching an extension.
    pub const ALL: [ModuleKind; 11] = [
        ModuleKind::Animation,
        ModuleKind::Archive,
        ModuleKind::Font,
        ModuleKind::Image,
        ModuleKind::LanguagePack,
        ModuleKind::Model,
        ModuleKind::OcclusionMesh,
        ModuleKind::Rig,
        ModuleKind::Skin,
        ModuleKind::Sound,
        ModuleKind::Video,
    ];

    /// Type name used in the manifest's `requireFormat` attribute.
    pub fn type_name(&self) -> &'static str {
        match self {
            ModuleKind::Animation => "Animation",
            ModuleKind::Archive => "Archive",
            ModuleKind::Font => "Font",
            ModuleKind::Image => "Image",
            ModuleKind::LanguagePack => "LanguagePack",
            ModuleKind::Model => "Model",
            ModuleKind::OcclusionMesh => "OcclusionMesh",
            ModuleKind::Rig => "Rig",
            ModuleKind::Skin => "Skin",
            ModuleKind::Sound => "Sound",
            ModuleKind::Video => "Video",
        }
    }
}

/// One loadable content module: which extensions it handles and whether
/// its format should be stored uncompressed.
#[derive(Debug, Clone)]
pub struct ContentModule {
    pub name: String,
    pub kind: ModuleKind,
    /// Handled extensions including the leading dot, lowercase.
    pub extensions: Vec<String>,
    /// Formats that are already compressed are stored, not deflated.
    pub no_compress: bool,
}

/// The set of content modules known to the hosting editor.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ContentModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: ContentModule) {
        self.modules.push(module);
    }

    /// Finds the module handling `extension` (leading dot, case
    /// insensitive), consulting kinds in [`ModuleKind::ALL`] order.
    pub fn find_matching(&self, extension: &str) -> Option<&ContentModule> {
        let wanted = extension.to_ascii_lowercase();
        ModuleKind::ALL.iter().find_map(|kind| {
            self.modules
                .iter()
                .find(|m| m.kind == *kind && m.extensions.iter().any(|e| *e == wanted))
        })
    }

    /// The stock engine module table.
    pub fn engine_default() -> Self {
        let mut registry = Self::new();
        let mut add = |name: &str, kind: ModuleKind, extensions: &[&str], no_compress: bool| {
            registry.add(ContentModule {
                name: name.into(),
                kind,
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
                no_compress,
            });
        };

        add("Drag[en]gine Animation", ModuleKind::Animation, &[".deanim"], false);
        add("DELGA", ModuleKind::Archive, &[".delga"], true);
        add("Drag[en]gine Font", ModuleKind::Font, &[".defont"], false);
        add("PNG", ModuleKind::Image, &[".png"], true);
        add("JPEG", ModuleKind::Image, &[".jpg", ".jpeg"], true);
        add("TGA", ModuleKind::Image, &[".tga"], false);
        add("Language Pack", ModuleKind::LanguagePack, &[".delangpack"], false);
        add("Drag[en]gine Model", ModuleKind::Model, &[".demodel"], false);
        add(
            "Drag[en]gine Occlusion Mesh",
            ModuleKind::OcclusionMesh,
            &[".deoccmesh"],
            false,
        );
        add("Drag[en]gine Rig", ModuleKind::Rig, &[".derig"], false);
        add("Drag[en]gine Skin", ModuleKind::Skin, &[".deskin"], false);
        add("OGG Vorbis", ModuleKind::Sound, &[".ogg"], true);
        add("Theora", ModuleKind::Video, &[".ogv"], true);

        registry
    }
}
