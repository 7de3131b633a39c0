#[macro_use]
mod common;

#[cfg(test)]
mod variable {
    tests! {
        redeclare_global in variable is OK
        "second"
    }

    tests! {
        uninitialized in variable is OK
        "nil"
    }

    tests! {
        duplicate_local in variable is ERR
        "[line 3] Error at 'a': Already a variable with this name in this scope."
    }

    tests! {
        undefined_global in variable is ERR
        "Undefined variable 'notDefined'."
        "[line 1]"
    }

    tests! {
        use_false_as_var in variable is ERR
        "[line 1] Error at 'false': Expect variable name."
    }

    tests! {
        use_local_in_initializer in variable is ERR
        "[line 3] Error at 'a': Can't read local variable in its own initializer."
    }
}
