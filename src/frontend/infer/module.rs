//! 模块加载与导入
//!
//! 模块名先在存根目录、再在模块目录中解析，依次尝试 `name.pyi`、
//! `name.py`、`name/__init__.py`。带点的名字先加载父包，再在父包目录中查找。
//! 模块按名字和路径记忆，并在构建模块体之前登记，循环导入因此可以终止。

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::builder::BuildCtx;
use super::errors::ErrorConfig;
use super::frame::FrameKind;
use super::graph::Graph;
use super::namespace::{SpaceId, SpaceKind};
use super::value::{BuiltinType, ModuleObj, Prim, Value, ValueId};
use super::Interpreter;
use crate::frontend::parser::ast::{ImportAlias, Module};
use crate::frontend::parser::{parse_file_source, parse_source, ParseError};

/// 模块加载错误
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("no module named {0}")]
    NotFound(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: syntax error at line {line}: {source}")]
    Parse {
        name: String,
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error("attempted relative import beyond top-level package")]
    RelativeBeyondTop,
}

/// `types` 模块中的名字
const TYPES_MODULE: &[(&str, BuiltinType)] = &[
    ("ObjectType", BuiltinType::Object),
    ("TypeType", BuiltinType::Type),
    ("NoneType", BuiltinType::NoneType),
    ("BooleanType", BuiltinType::Bool),
    ("IntType", BuiltinType::Int),
    ("LongType", BuiltinType::Long),
    ("FloatType", BuiltinType::Float),
    ("ComplexType", BuiltinType::Complex),
    ("StringTypes", BuiltinType::BaseString),
    ("StringType", BuiltinType::Str),
    ("UnicodeType", BuiltinType::Unicode),
    ("FileType", BuiltinType::File),
    ("XRangeType", BuiltinType::XRange),
    ("ListType", BuiltinType::List),
    ("TupleType", BuiltinType::Tuple),
    ("DictType", BuiltinType::Dict),
    ("DictionaryType", BuiltinType::Dict),
    ("GeneratorType", BuiltinType::Generator),
    ("FunctionType", BuiltinType::Function),
    ("LambdaType", BuiltinType::Function),
    ("BuiltinFunctionType", BuiltinType::BuiltinFunction),
    ("BuiltinMethodType", BuiltinType::BuiltinFunction),
    ("MethodType", BuiltinType::Method),
    ("UnboundMethodType", BuiltinType::Method),
    ("ModuleType", BuiltinType::Module),
    ("TracebackType", BuiltinType::Traceback),
];

const STUB_EXTENSIONS: [&str; 2] = ["pyi", "py"];

impl Interpreter {
    /// 加载一段源码作为模块
    pub fn load_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<ValueId, ModuleError> {
        let module = parse_source(source, name).map_err(|e| ModuleError::Parse {
            name: name.to_string(),
            line: e.line(),
            source: e,
        })?;
        Ok(self.load_module(&module))
    }

    /// 加载一个文件作为顶层模块，模块名取文件名
    pub fn load_main(
        &mut self,
        path: &Path,
    ) -> Result<ValueId, ModuleError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "__main__".to_string());
        self.load_file(&name, path)
    }

    /// 加载文件；同一路径只加载一次
    pub fn load_file(
        &mut self,
        name: &str,
        path: &Path,
    ) -> Result<ValueId, ModuleError> {
        if let Some(&module) = self.module_paths.get(path) {
            return Ok(module);
        }
        let source = fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let module = parse_file_source(&source, name, path).map_err(|e| ModuleError::Parse {
            name: name.to_string(),
            line: e.line(),
            source: e,
        })?;
        Ok(self.load_module(&module))
    }

    /// 按模块名导入（带点的名字先导入父包）
    pub fn import(
        &mut self,
        name: &str,
    ) -> Result<ValueId, ModuleError> {
        if let Some(&module) = self.modules.get(name) {
            return Ok(module);
        }
        if let Some(module) = self.native_module(name) {
            return Ok(module);
        }

        let (dirs, last, parent) = match name.rsplit_once('.') {
            Some((package, last)) => {
                let parent = self.import(package)?;
                let dir = self
                    .module_obj(parent)
                    .and_then(|m| m.path.as_deref())
                    .and_then(Path::parent)
                    .map(Path::to_path_buf);
                match dir {
                    Some(dir) => (vec![dir], last, Some(parent)),
                    None => return Err(ModuleError::NotFound(name.to_string())),
                }
            }
            None => {
                let mut dirs = self.stub_dirs.clone();
                dirs.extend(self.module_dirs.iter().cloned());
                (dirs, name, None)
            }
        };

        let path = find_module(&dirs, last).ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        let module = self.load_file(name, &path)?;
        // 子模块同时是父包的属性
        if let Some(parent) = parent {
            if let Some(space) = self.module_obj(parent).map(|m| m.space) {
                let node = self.graph.simple_node(module);
                self.bind_name(space, last, node);
            }
        }
        Ok(module)
    }

    /// 创建模块对象并构建模块体
    fn load_module(
        &mut self,
        ast: &Module,
    ) -> ValueId {
        let (module, fresh) = self.new_module(&ast.name, ast.path.clone(), ast.is_stub);
        if fresh {
            tracing::info!(
                "loading module {}{}",
                ast.name,
                ast.path
                    .as_ref()
                    .map(|p| format!(" from {}", p.display()))
                    .unwrap_or_default()
            );
            self.build_module_body(module, &ast.body);
        }
        module
    }

    /// 新建（或取回已登记的）模块值
    fn new_module(
        &mut self,
        name: &str,
        path: Option<PathBuf>,
        is_stub: bool,
    ) -> (ValueId, bool) {
        if let Some(&module) = self.modules.get(name) {
            return (module, false);
        }
        let space = self.new_space(name, SpaceKind::Module, Some(self.builtin_space));
        self.register_module(name, path, is_stub, space)
    }

    fn register_module(
        &mut self,
        name: &str,
        path: Option<PathBuf>,
        is_stub: bool,
        space: SpaceId,
    ) -> (ValueId, bool) {
        let module = self.push_value(Value::Prim(Prim::Object));
        let frame = self.new_frame(None, FrameKind::Module(module), name, "");
        *self.value_mut(module) = Value::Module(Box::new(ModuleObj {
            name: name.to_string(),
            path: path.clone(),
            space,
            frame,
            is_stub,
        }));
        self.modules.insert(name.to_string(), module);
        if let Some(path) = path {
            self.module_paths.insert(path, module);
        }
        if space != self.builtin_space {
            let string = self.prim(Prim::Str);
            for attr in ["__name__", "__file__", "__doc__"] {
                let var = self.get_or_create_var(space, attr);
                self.graph.add(var, string);
            }
        }
        (module, true)
    }

    /// 由解释器自身提供的模块
    fn native_module(
        &mut self,
        name: &str,
    ) -> Option<ValueId> {
        match name {
            "__builtin__" => {
                let space = self.builtin_space;
                Some(self.register_module(name, None, true, space).0)
            }
            "exceptions" => {
                let (module, _) = self.new_module(name, None, true);
                let space = self.module_obj(module)?.space;
                let classes: Vec<(String, ValueId)> = self
                    .exception_classes
                    .iter()
                    .map(|(n, &c)| (n.clone(), c))
                    .collect();
                for (class_name, class) in classes {
                    let var = self.get_or_create_var(space, &class_name);
                    self.graph.add(var, class);
                }
                Some(module)
            }
            "types" => {
                let (module, _) = self.new_module(name, None, true);
                let space = self.module_obj(module)?.space;
                for (type_name, ty) in TYPES_MODULE {
                    let value = self.type_value(*ty);
                    let var = self.get_or_create_var(space, type_name);
                    self.graph.add(var, value);
                }
                Some(module)
            }
            _ => None,
        }
    }

    /// 导入失败：在导入者的帧上报告 `ImportError`
    fn import_error(
        &mut self,
        ctx: &BuildCtx,
        line: usize,
        name: &str,
        error: &ModuleError,
    ) {
        tracing::warn!("import of {} failed: {}", name, error);
        if self.config.ignore_import_errors {
            return;
        }
        let spec = ErrorConfig::import_failed(name, &error.to_string());
        self.raise_spec(ctx.frame, line, &spec);
    }

    /// `import a.b.c [as x]`
    pub(crate) fn build_import(
        &mut self,
        ctx: &mut BuildCtx,
        aliases: &[ImportAlias],
        line: usize,
    ) {
        for alias in aliases {
            let module = match self.import(&alias.name) {
                Ok(module) => module,
                Err(e) => {
                    self.import_error(ctx, line, &alias.name, &e);
                    continue;
                }
            };
            let (bound, value) = match &alias.asname {
                Some(asname) => (asname.clone(), module),
                None => {
                    // `import a.b` 绑定的是顶层包 `a`
                    let top = alias.name.split('.').next().unwrap_or(&alias.name);
                    match self.modules.get(top) {
                        Some(&top_module) => (top.to_string(), top_module),
                        None => (alias.name.clone(), module),
                    }
                }
            };
            let node = self.graph.simple_node(value);
            self.bind_name(ctx.space, &bound, node);
        }
    }

    /// `from module import names`，`names` 为空表示 `*`
    pub(crate) fn build_import_from(
        &mut self,
        ctx: &mut BuildCtx,
        module: &str,
        names: &[ImportAlias],
        level: usize,
        line: usize,
    ) {
        let full = match self.resolve_relative(&ctx.module, module, level) {
            Ok(full) => full,
            Err(e) => {
                self.import_error(ctx, line, module, &e);
                return;
            }
        };
        let source = match self.import(&full) {
            Ok(source) => source,
            Err(e) => {
                self.import_error(ctx, line, &full, &e);
                return;
            }
        };
        let Some(space) = self.module_obj(source).map(|m| m.space) else {
            return;
        };

        if names.is_empty() {
            let public: Vec<(String, _)> = self.spaces[space.index()]
                .vars
                .iter()
                .filter(|(name, _)| !name.starts_with('_'))
                .map(|(name, &var)| (name.clone(), var))
                .collect();
            for (name, var) in public {
                self.bind_name(ctx.space, &name, var);
            }
            return;
        }

        for alias in names {
            let bound = alias.asname.as_deref().unwrap_or(&alias.name);
            let node = match self.local_var(space, &alias.name) {
                Some(var) => var,
                None => match self.import(&format!("{}.{}", full, alias.name)) {
                    Ok(sub) => self.graph.simple_node(sub),
                    Err(_) => {
                        if !self.config.ignore_import_errors {
                            let spec = ErrorConfig::name_not_in_module(&full, &alias.name);
                            self.raise_spec(ctx.frame, line, &spec);
                        }
                        Graph::UNDEFINED
                    }
                },
            };
            self.bind_name(ctx.space, bound, node);
        }
    }

    /// 相对导入：`level` 个点从当前包向上
    fn resolve_relative(
        &self,
        current: &str,
        module: &str,
        level: usize,
    ) -> Result<String, ModuleError> {
        if level == 0 {
            return Ok(module.to_string());
        }
        let is_package = self
            .modules
            .get(current)
            .and_then(|&m| self.module_obj(m))
            .and_then(|m| m.path.as_deref())
            .and_then(Path::file_stem)
            .is_some_and(|stem| stem == "__init__");
        let mut parts: Vec<&str> = current.split('.').collect();
        if !is_package {
            parts.pop();
        }
        for _ in 1..level {
            if parts.pop().is_none() {
                return Err(ModuleError::RelativeBeyondTop);
            }
        }
        if parts.is_empty() && module.is_empty() {
            return Err(ModuleError::RelativeBeyondTop);
        }
        if module.is_empty() {
            return Ok(parts.join("."));
        }
        parts.push(module);
        Ok(parts.join("."))
    }

    /// 已加载的模块
    pub fn module(
        &self,
        name: &str,
    ) -> Option<ValueId> {
        self.modules.get(name).copied()
    }

    /// 按加载顺序列出模块
    pub fn loaded_modules(&self) -> impl Iterator<Item = (&str, ValueId)> {
        self.modules.iter().map(|(name, &m)| (name.as_str(), m))
    }
}

/// 在目录列表中查找模块文件
fn find_module(
    dirs: &[PathBuf],
    name: &str,
) -> Option<PathBuf> {
    for dir in dirs {
        for ext in STUB_EXTENSIONS {
            let file = dir.join(format!("{}.{}", name, ext));
            if file.is_file() {
                return Some(file);
            }
        }
        for ext in STUB_EXTENSIONS {
            let init = dir.join(name).join(format!("__init__.{}", ext));
            if init.is_file() {
                return Some(init);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::AnalyzerConfig;

    fn interp() -> Interpreter {
        let mut config = AnalyzerConfig::default();
        config.use_default_path = false;
        Interpreter::new(&config)
    }

    #[test]
    fn test_find_module_prefers_stub() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("m.pyi"), "x = 1\n").unwrap();
        let found = find_module(&[dir.path().to_path_buf()], "m").unwrap();
        assert_eq!(found.extension().unwrap(), "pyi");
    }

    #[test]
    fn test_find_package_init() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg").join("__init__.py"), "").unwrap();
        let found = find_module(&[dir.path().to_path_buf()], "pkg").unwrap();
        assert!(found.ends_with("pkg/__init__.py"));
    }

    #[test]
    fn test_relative_from_module() {
        let mut interp = interp();
        interp.new_module("pkg.sub.mod", None, false);
        assert_eq!(interp.resolve_relative("pkg.sub.mod", "x", 1).unwrap(), "pkg.sub.x");
        assert_eq!(interp.resolve_relative("pkg.sub.mod", "x", 2).unwrap(), "pkg.x");
        assert_eq!(interp.resolve_relative("pkg.sub.mod", "", 2).unwrap(), "pkg");
        assert!(interp.resolve_relative("top", "", 1).is_err());
    }

    #[test]
    fn test_native_modules() {
        let mut interp = interp();
        let types = interp.import("types").unwrap();
        let space = interp.module_obj(types).unwrap().space;
        assert!(interp.local_var(space, "IntType").is_some());
        let exceptions = interp.import("exceptions").unwrap();
        let space = interp.module_obj(exceptions).unwrap().space;
        assert!(interp.local_var(space, "KeyError").is_some());
        assert_eq!(interp.import("types").unwrap(), types);
    }

    #[test]
    fn test_missing_module() {
        let mut interp = interp();
        assert!(matches!(
            interp.import("no_such_module_here"),
            Err(ModuleError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_error_reported() {
        let mut interp = interp();
        let err = interp.load_source("bad", "def (:\n").unwrap_err();
        assert!(matches!(err, ModuleError::Parse { .. }));
    }
}
