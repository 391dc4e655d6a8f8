pub const PARAMETER_SUM: &str = r#"
    [
    1 => ($a, $b) {
    $a + $b
    }
    MAIN => () {
    [1](1,1)
    }
    ]
"#;

pub const COMMENTS: &str = r#"
    // The preamble may hold comments
    ~~~
    Everything in here is ignored,
    even ] and [
    ~~~
    [
    0 => 'kept' // trailing remark
    // 1 => 'dropped'
    666 => () {
    // not a statement
    [0]
    ~~~
    'also dropped'
    ~~~
    'a // b'
    }
    ]
"#;

pub const CONSTANTS: &str = r#"
    def GREET 1
    def WORD 'ahoy'
    [
    GREET => () {
    WORD
    }
    MAIN => () {
    [GREET]()
    }
    ]
"#;

pub const OBJECTS: &str = r#"
    [
    1 => [
    0 => 'inner'
    1 => [7, 8]
    2 => () {
    [0] ^ '!'
    }
    ]
    666 => () {
    [1][0]
    }
    ]
"#;

pub const OBJECTS_BEFORE_ARRAYS: &str = r#"
    [
    3 => ['array']
    3 => [
    0 => 'object'
    ]
    666 => () {
    [3][0]
    }
    ]
"#;

pub const METHOD_CALL: &str = r#"
    [
    0 => 'outer'
    1 => [
    0 => 'inner'
    2 => ($suffix) {
    [here][0] = [0] ^ $suffix
    [5] = [here][0]
    }
    ]
    666 => () {
    [1][2]('!')
    }
    ]
"#;

pub const SCALARS: &str = r#"
    [
    0 => 'ahoy matey'
    1 => 42
    2 => plain
    666 => () {
    [0]
    }
    ]
"#;

pub const REGISTERS: &str = r#"
    [
    666 => () {
    [here][0] = 1
    [here][0] + 1
    }
    ]
"#;

pub const DEEP_PARAMETER_SCOPES: &str = r#"
    [
    1 => ($a) {
    [2]('callee')
    }
    2 => ($a) {
    $a
    }
    666 => () {
    [1]('caller')
    }
    ]
"#;

pub const LEAKED_PARAMETER: &str = r#"
    [
    1 => ($a) {
    [2]()
    }
    2 => () {
    $a
    }
    666 => () {
    [1]('caller')
    }
    ]
"#;

pub const FALSE_CONDITION: &str = r#"
    [
    0 => 'untouched'
    666 => () {
    if 1 > 2
    [0] = 'touched'
    out('touched')

    }
    ]
"#;

pub const FOR_LOOP: &str = r#"
    [
    666 => () {
    [here][0] = 0
    for ([here][0] < 10; [here][0] = [here][0] + 1)
    [here][1] = [here][0]

    [here][1]
    }
    ]
"#;

pub const NEVER_LOOPS: &str = r#"
    [
    666 => () {
    [here][0] = 5
    for ([here][0] < 5; [here][0] = [here][0] + 1)
    'unreached'

    }
    ]
"#;

pub const TRUE_CONDITION: &str = r#"
    [
    666 => () {
    if 1 < 2
    'first'
    'second'

    }
    ]
"#;

pub const ARRAYS: &str = r#"
    [
    0 => [1, 2, 3]
    666 => () {
    [0][] = 4
    out([0][3])
    size(&[0])
    }
    ]
"#;

pub const WHITESPACE_OVERFLOW: &str = r#"
    [
    666 => () {
    'one'

    'two'
    }
    ]
"#;

pub const RECURSIVE_SUM: &str = r#"
    [
    1 => ($n) {
    [here][0] = 0
    if $n > 0
    [here][0] = $n + [1]($n - 1)

    [here][0]
    }
    666 => ($n) {
    [1]($n)
    }
    ]
"#;

pub const SHARED_REGISTERS: &str = r#"
    [
    1 => ($n) {
    [here][0] = $n
    if $n > 0
    [1]($n - 1)

    [here][0]
    }
    666 => () {
    [1](3)
    }
    ]
"#;

pub const FORWARD_REFERENCE: &str = r#"
    [
    666 => () {
    [1]()
    }
    1 => () {
    [2] ^ [3]
    }
    2 => 'late'
    3 => 'bound'
    ]
"#;

pub const RUNAWAY: &str = r#"
    [
    1 => () {
    [1]()
    }
    666 => () {
    [1]()
    }
    ]
"#;

pub const FIZZBUZZ: &str = r#"
    def LIMIT 15
    [
    1 => ($i) {
    [here][1] = $i % 3
    [here][2] = $i % 5
    [here][0] = $i
    if [here][1] == 0
    [here][0] = 'Fizz'

    if [here][2] == 0
    [here][0] = 'Buzz'

    [here][3] = [here][1] + [here][2]
    if [here][3] == 0
    [here][0] = 'FizzBuzz'

    out([here][0] ^ ' ')
    }
    MAIN => () {
    [here][9] = 1
    for ([here][9] <= LIMIT; [here][9] = [here][9] + 1)
    [1]([here][9])

    }
    ]
"#;
