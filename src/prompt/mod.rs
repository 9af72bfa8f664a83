fn preamble() -> &'static str {
    "You are an AI developer who is trying to write a program that will generate code for the user based on their intent."
}

pub fn system_prompt_plan() -> String {
    format!(
        r#"{preamble}

When given their intent, create a complete, exhaustive list of filepaths that the user would write to make the program.

only list the filepaths you would write, and return them as a python list of strings.
do not add any other explanation, only return a python list of strings."#,
        preamble = preamble()
    )
}

pub fn user_prompt_plan(intent: &str) -> String {
    intent.to_string()
}

pub fn system_prompt_dependencies(intent: &str, plan_text: &str) -> String {
    format!(
        r#"{preamble}

In response to the user's prompt:

---
the app is: {intent}
---

the files we have decided to generate are: {plan_text}

Now that we have a list of files, we need to understand what dependencies they share.
Please name and briefly describe what is shared between the files we are generating, including exported variables, data schemas, id names of every DOM elements that javascript functions will use, message names, and function names.
Exclusively focus on the names of the shared dependencies, and do not add any other explanation."#,
        preamble = preamble()
    )
}

pub fn user_prompt_dependencies(intent: &str) -> String {
    intent.to_string()
}

pub fn system_prompt_codegen(intent: &str, plan_text: &str, manifest_text: &str) -> String {
    format!(
        r#"{preamble}

the app is: {intent}

the files we have decided to generate are: {plan_text}

the shared dependencies (like filenames and variable names) we have decided on are: {manifest_text}

only write valid code for the given filepath and file type, and return only the code.
do not add any other explanation, only return valid code for that file type."#,
        preamble = preamble()
    )
}

pub fn user_prompt_codegen(intent: &str, path: &str) -> String {
    format!(
        r#"We have broken up the program into per-file generation.
Now your job is to generate only the code for the file {path}.
Make sure to have consistent filenames if you reference other files we are also generating.

Remember that you must obey 3 things:
   - you are generating code for the file {path}
   - do not stray from the names of the files and the shared dependencies we have decided on
   - MOST IMPORTANT OF ALL - the purpose of our app is {intent} - every line of code you generate must be valid code. Do not include code fences in your response, for example

Bad response:
```javascript
console.log("hello world")
```

Good response:
console.log("hello world")

Begin generating the code now."#
    )
}
