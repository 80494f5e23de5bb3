//! 内建函数、方法与容器

use super::*;

#[test]
fn test_len_and_range() {
    let interp = analyze("n = len([1, 2])\nr = range(n)\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "n"), "int");
    assert_eq!(var(&interp, "r"), "[int]");
}

#[test]
fn test_builtin_argument_type_checked() {
    let diagnostics = diagnostics_of("x = range('a')\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_str_methods() {
    let interp = analyze("parts = 'a,b'.split(',')\nj = '-'.join(parts)\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "parts"), "[str]");
    assert_eq!(var(&interp, "j"), "str");
}

#[test]
fn test_dict_methods() {
    let interp = analyze(
        "d = {}\nd['a'] = 1\nks = d.keys()\nv = d.get('a')\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "ks"), "[str]");
    assert_eq!(var(&interp, "v"), "None|int");
}

#[test]
fn test_unknown_method_is_attribute_error() {
    let diagnostics = diagnostics_of("[].nope()\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "AttributeError");
}

#[test]
fn test_list_concat_and_repeat() {
    let interp = analyze("a = [1] + ['s']\nb = [1] * 3\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "a"), "[int|str]");
    assert_eq!(var(&interp, "b"), "[int]");
}

#[test]
fn test_string_format() {
    let interp = analyze("s = '%d items' % 3\n");
    assert_eq!(var(&interp, "s"), "str");
}

#[test]
fn test_tuple_index() {
    let interp = analyze("t = (1, 'a')\nx = t[1]\n");
    assert_eq!(var(&interp, "x"), "str");
}

#[test]
fn test_tuple_index_out_of_range() {
    let diagnostics = diagnostics_of("t = (1, 'a')\nx = t[2]\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "IndexError");
}

#[test]
fn test_list_comprehension() {
    let interp = analyze("xs = [str(i) for i in range(3)]\n");
    assert_eq!(var(&interp, "xs"), "[str]");
}

#[test]
fn test_generator_expression() {
    let interp = analyze("g = (i * 1.0 for i in [1, 2])\n");
    assert_eq!(var(&interp, "g"), "<generator float>");
}

#[test]
fn test_iterating_int_fails() {
    let diagnostics = diagnostics_of("for x in 3:\n    pass\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_none_operations_ignored_by_default() {
    assert!(diagnostics_of("x = None\ny = x.attr\n").is_empty());
}

#[test]
fn test_none_operations_reported_when_enabled() {
    let mut config = config();
    config.ignore_none = false;
    let interp = analyze_with("x = None\ny = x.attr\n", &config);
    assert_eq!(codes(&interp), vec!["AttributeError".to_string()]);
}

#[test]
fn test_set_operations() {
    let interp = analyze("s = set([1]) | set(['a'])\n");
    assert_eq!(var(&interp, "s"), "set([int|str])");
}

#[test]
fn test_isinstance_assertion() {
    let diagnostics = diagnostics_of(
        "def f(x):\n    assert isinstance(x, str)\n    return x\nf(1)\n",
    );
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_dict_pop_without_default() {
    let interp = analyze("d = {'a': 1}\nv = d.pop('a')\nw = d.get('a', 's')\n");
    assert_eq!(var(&interp, "v"), "int");
    assert_eq!(var(&interp, "w"), "int|str");
}

#[test]
fn test_generator_send_reaches_yield() {
    let interp = analyze(
        "def gen():\n    x = yield 1\n    yield x\n\
         g = gen()\n\
         y = g.send('s')\n",
    );
    assert_eq!(var(&interp, "g"), "<generator int|str>");
    assert_eq!(var(&interp, "y"), "int|str");
}

#[test]
fn test_set_intersection_keeps_shared_types() {
    let interp = analyze(
        "s = set([1, 'a']) & set([2])\nt = set([1, 'a']).intersection([2])\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "s"), "set([int])");
    assert_eq!(var(&interp, "t"), "set([int])");
}

#[test]
fn test_dict_from_flat_sequence() {
    let diagnostics = diagnostics_of("d = dict([1, 2])\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
    assert!(diagnostics[0].message.contains("int"), "{:?}", diagnostics);
}
