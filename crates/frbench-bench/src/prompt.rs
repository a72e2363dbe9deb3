//! Prompt texts sent to the models.

use crate::config::PromptMode;

pub const SYSTEM_PROMPT: &str = "You will be provided with a partial codebase inside the app/ directory \
and an issue statement explaining what needs to be changed in that codebase.";

const FENCE: &str = "```";

/// Build the prompt for one requirement from its description and the
/// marker-delimited workspace codebase.
pub fn build(mode: PromptMode, description: &str, codebase: &[u8]) -> Vec<u8> {
    let codebase = String::from_utf8_lossy(codebase);
    let text = match mode {
        PromptMode::Write => write_prompt(description, &codebase),
        PromptMode::Patch => patch_prompt(description, &codebase),
    };
    text.into_bytes()
}

fn write_prompt(description: &str, codebase: &str) -> String {
    format!(
        r#"You will be provided with a partial codebase inside the app/ directory and an issue statement explaining what needs to be changed in that codebase. The changes made need to make all provided tests pass but you can't change or add any tests.
<issue>
{description}
</issue>
<codebase>
{codebase}
</codebase>
Here is an example of a generated list of files. It consists of code blocks annotated with the language. Comments specify the start and end of each file and its name.
<files>
{FENCE}go
// start of file.go
package main

import "fmt"

func main() {{
	fmt.Println(getNumber())
}}
// end of file.go
// start of numbers.go
package main

func getNumber() int {{
	return 7
}}
// end of numbers.go
{FENCE}
</files>
I need you to implement changes needed to solve the issue and provide all files changed in the format shown above. Please respond with a list of non-test files in the format shown above. Don't add any additional text or comments only the file contents.
Respond below:
"#
    )
}

fn patch_prompt(description: &str, codebase: &str) -> String {
    format!(
        r#"You will be provided with a full codebase inside the app/ directory and an issue statement explaining what needs to be changed in that codebase. The changes made need to make all provided tests pass but you can't change any tests.
<issue>
{description}
</issue>
<codebase>
{codebase}
</codebase>
Here is an example of a patch file. It consists of changes to files in the codebase. It specifies the file names, the line numbers of each change, and the removed and added lines. A single patch file can contain changes to multiple files.
<patch>
--- a/app/file.go
+++ b/app/file.go
@@ -1,8 +1,8 @@
 package main

 func Euclidean(a, b int) int {{
-	for b != 0 {{
-		a, b = b, a/b
+	if b == 0 {{
+		return a
 	}}
-	return a
+	return Euclidean(b, a/b)
 }}

</patch>
I need you to implement the required changes and only the required changes by generating a single patch file that can be applied directly using git apply. Please respond with a single patch file in the format shown above. Don't add any additional text or comments only the patch file contents.
Respond below:
"#
    )
}
